//! `info`: build metadata.

use crate::error::BackendResult;
use crate::request::{NoFields, Request, Response};
use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commit the crate was built from, injected through `LDVAULT_GIT_COMMIT`.
pub const GIT_COMMIT: &str = match option_env!("LDVAULT_GIT_COMMIT") {
    Some(commit) => commit,
    None => "unknown",
};

#[derive(Debug, Serialize)]
struct Info {
    version: &'static str,
    commit: &'static str,
}

pub fn read(request: &Request) -> BackendResult<Option<Response>> {
    request.fields::<NoFields>()?;
    let info = Info {
        version: VERSION,
        commit: GIT_COMMIT,
    };
    Ok(Some(Response::from_serialize(&info)?))
}
