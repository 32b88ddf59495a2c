use crate::context::AppContext;
use crate::resolver::DockerResolver;
use libmanifesto::Manifesto;

/// Get command handler
pub mod get;

/// List command handler and output type
pub mod list;

/// Put command handler
pub mod put;

/// Version command handler
pub mod version;

/// Builds the metadata store for the resolved context
///
/// Prompts for a password when only a username is configured.
pub fn open_manifesto(ctx: &AppContext) -> Result<Manifesto, String> {
    let credentials = ctx.credentials()?;
    Manifesto::builder()
        .with_config(ctx.config.clone())
        .with_credentials(credentials)
        .resolver(DockerResolver::from_settings(&ctx.config.resolver))
        .build()
        .map_err(|e| e.to_string())
}

/// Prints an error and exits with a non-zero status
pub fn fail(ctx: &AppContext, message: &str) -> ! {
    crate::format::create_formatter(ctx).error(message);
    std::process::exit(1);
}

#[cfg(test)]
pub(crate) mod test_support;
