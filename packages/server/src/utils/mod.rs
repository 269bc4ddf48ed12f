pub mod filename;
pub mod id_token;
