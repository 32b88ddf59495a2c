//! Basic usage example for the manifesto library.
//!
//! Attaches a small document to an image in a local registry, then lists and
//! reads the image's metadata back.
//!
//! Run with: cargo run --example basic_usage

use libmanifesto::config::Config;
use libmanifesto::resolver::StaticResolver;
use libmanifesto::{Digest, Manifesto};

const IMAGE: &str = "localhost:5000/acme/widget:v1";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("manifesto library - basic usage example\n");

    // Any digest works for a demonstration; real callers resolve the image.
    let image_digest = Digest::of(b"acme/widget:v1");
    let resolver = StaticResolver::new().with_image(IMAGE, image_digest.as_str());

    let mut config = Config::default();
    config.registry.insecure = true;

    let manifesto = Manifesto::builder()
        .with_config(config)
        .resolver(resolver)
        .build()?;

    let report = std::env::temp_dir().join("manifesto-example-scan.json");
    std::fs::write(&report, br#"{"critical": 0, "high": 2}"#)?;

    match manifesto.put(IMAGE, "scan", &report) {
        Ok(name) => println!("✓ Stored 'scan' metadata for {}\n", name),
        Err(e) => {
            eprintln!("✗ Failed to store metadata: {}", e);
            eprintln!("  Make sure a registry is running at localhost:5000");
            eprintln!("  You can start one with: docker run -d -p 5000:5000 registry:2");
            return Ok(());
        }
    }

    let (types, name) = manifesto.list(IMAGE)?;
    println!("Metadata types stored for image '{}':", name);
    for metadata_type in &types {
        println!("    {}", metadata_type);
    }

    if let (Some(data), _) = manifesto.get(IMAGE, "scan")? {
        println!("\nscan: {}", String::from_utf8_lossy(&data).trim());
    }

    std::fs::remove_file(&report)?;
    Ok(())
}
