mod common;
mod experiment;
mod files;
mod session;
