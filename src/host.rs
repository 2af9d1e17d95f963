use crate::error::HostResolutionError;

/// Source of the local host name used for the `host` field.
///
/// Called once each time a layout is configured without an explicit host
/// name; never on the render path.
pub trait HostNameResolver {
    fn resolve_host_name(&self) -> Result<String, HostResolutionError>;
}

/// Resolves the host name from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemHostName;

impl HostNameResolver for SystemHostName {
    fn resolve_host_name(&self) -> Result<String, HostResolutionError> {
        let name = hostname::get().map_err(HostResolutionError::Lookup)?;
        let name = name.into_string().map_err(|_| HostResolutionError::NotUnicode)?;
        if name.is_empty() {
            return Err(HostResolutionError::Empty);
        }
        Ok(name)
    }
}

/// Always answers with the same name. Handy for tests and containers
/// where the OS host name is meaningless.
#[derive(Clone, Debug)]
pub struct FixedHostName(pub String);

impl HostNameResolver for FixedHostName {
    fn resolve_host_name(&self) -> Result<String, HostResolutionError> {
        Ok(self.0.clone())
    }
}

impl<F> HostNameResolver for F
where
    F: Fn() -> Result<String, HostResolutionError>,
{
    fn resolve_host_name(&self) -> Result<String, HostResolutionError> {
        self()
    }
}
