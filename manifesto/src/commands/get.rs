use crate::context::{AppContext, VerbosityLevel};
use crate::format;
use libmanifesto::Manifesto;
use std::io::Write;

/// Result of looking up one metadata type
#[derive(Debug, PartialEq, Eq)]
pub enum GetOutcome {
    Found(Vec<u8>),
    Missing { image: String },
}

/// Fetch the `metadata_type` blob of `image`
pub fn get_metadata(
    manifesto: &Manifesto,
    image: &str,
    metadata_type: &str,
) -> Result<GetOutcome, String> {
    let (data, image) = manifesto
        .get(image, metadata_type)
        .map_err(|e| e.to_string())?;
    Ok(match data {
        Some(data) => GetOutcome::Found(data),
        None => GetOutcome::Missing { image },
    })
}

/// Handle the get subcommand
///
/// The blob is written to stdout as-is; a missing blob is reported on stderr
/// and is not an error.
pub fn handle_get(ctx: &AppContext, image: &str, metadata_type: &str) {
    let manifesto = match super::open_manifesto(ctx) {
        Ok(manifesto) => manifesto,
        Err(e) => super::fail(ctx, &e),
    };

    let formatter = format::create_formatter(ctx);
    let spinner = formatter.spinner(&format!("Fetching '{}' metadata...", metadata_type));
    let result = get_metadata(&manifesto, image, metadata_type);
    spinner.finish_and_clear();

    match result {
        Ok(GetOutcome::Found(data)) => {
            format::print(
                ctx,
                VerbosityLevel::Verbose,
                &format!("Read {} bytes of '{}' metadata", data.len(), metadata_type),
            );
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(&data).and_then(|_| stdout.flush()) {
                super::fail(ctx, &format!("Failed to write metadata: {}", e));
            }
        }
        Ok(GetOutcome::Missing { image }) => formatter.warning(&format!(
            "Could not find '{}' metadata for image '{}'",
            metadata_type, image
        )),
        Err(e) => super::fail(ctx, &e),
    }
}

#[cfg(test)]
#[path = "get_tests.rs"]
mod tests;
