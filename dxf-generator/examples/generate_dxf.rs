// Example: Convert a floor plan image into a DXF file
use std::fs;
use dxf_generator::{DxfGenerator, GenerationSettings, GeneratorConfig, Quality};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("📐 Floor Plan → DXF Generator");
    println!("=============================\n");

    let config = match GeneratorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            eprintln!("\nPlease set your API key:");
            eprintln!("  export OPENROUTER_API_KEY=sk-or-...");
            return Ok(());
        }
    };

    // Get image path and quality from command line
    let args: Vec<String> = std::env::args().collect();
    let Some(image_path) = args.get(1) else {
        eprintln!("Usage: cargo run --example generate_dxf IMAGE_PATH [fast|balanced|high]");
        return Ok(());
    };
    let quality = args.get(2).map(|q| Quality::from(q.as_str())).unwrap_or_default();

    println!("📂 Loading image: {}", image_path);
    let image_bytes = fs::read(image_path)?;
    println!("✅ Loaded {} bytes\n", image_bytes.len());

    let generator = DxfGenerator::new(&config);
    let settings = GenerationSettings {
        quality,
        ..GenerationSettings::default()
    };

    println!("🤖 Tracing with {} ({} quality)...\n", generator.default_model(), quality);

    let outcome = generator.generate_from_image_bytes(&image_bytes, &settings).await;

    if let Some(error) = &outcome.metadata.error {
        eprintln!("❌ Generation failed: {}", error);
        return Ok(());
    }

    println!("Valid DXF: {}", outcome.is_valid);
    println!("Tokens used: {}", outcome.metadata.tokens_used.unwrap_or(0));

    let output_path = "converted.dxf";
    fs::write(output_path, &outcome.dxf)?;
    println!("💾 Saved DXF to: {}", output_path);

    if !outcome.is_valid {
        fs::write("converted.raw.txt", &outcome.raw)?;
        println!("⚠️  Output failed validation, raw reply saved to converted.raw.txt");
    }

    Ok(())
}
