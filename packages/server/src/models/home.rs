use serde::Serialize;

/// Identity of the signed-in user.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    /// Subject identifier assigned by the identity provider.
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HomeLinks {
    #[schema(example = "/files/new-experiment")]
    pub new_experiment: &'static str,
    #[schema(example = "/files/list-files")]
    pub list_files: &'static str,
    #[schema(example = "/logout")]
    pub logout: &'static str,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HomeResponse {
    pub user: UserInfo,
    pub links: HomeLinks,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
}
