use std::io;

/// Error returned when the local host name cannot be determined.
#[derive(thiserror::Error, Debug)]
pub enum HostResolutionError {
    #[error("unable to determine name of the local host")]
    Lookup(#[source] io::Error),

    #[error("local host name is not valid unicode")]
    NotUnicode,

    #[error("local host name is empty")]
    Empty,
}
