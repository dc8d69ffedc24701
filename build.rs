use image::GenericImageView;
use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Panel size, must match `tft::TFT_WIDTH` / `tft::TFT_HEIGHT`
const PANEL_WIDTH: u32 = 240;
const PANEL_HEIGHT: u32 = 320;

/// Convert PNG image to raw RGB565 (big endian) at build time
fn convert_image_to_rgb565(
    input_path: &str,
    output_path: &str,
    target_width: u32,
    target_height: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={}", input_path);

    // Check if input file exists
    if !Path::new(input_path).exists() {
        println!("cargo:warning=Image file '{}' not found, skipping conversion", input_path);
        // Create empty file so include_bytes! still works
        File::create(output_path)?;
        return Ok(());
    }

    let img = image::open(input_path)?;
    let (orig_width, orig_height) = img.dimensions();
    println!("cargo:warning=Converting {} ({}x{})", input_path, orig_width, orig_height);

    // Fit inside the panel, preserving aspect ratio
    let orig_ratio = orig_width as f32 / orig_height as f32;
    let target_ratio = target_width as f32 / target_height as f32;
    let (new_width, new_height) = if orig_ratio > target_ratio {
        (target_width, (target_width as f32 / orig_ratio) as u32)
    } else {
        ((target_height as f32 * orig_ratio) as u32, target_height)
    };

    let rgb = img
        .resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
        .to_rgb8();

    let offset_x = (target_width - rgb.width()) / 2;
    let offset_y = (target_height - rgb.height()) / 2;

    // Black background with the image centred
    let mut buffer = vec![0u8; (target_width * target_height * 2) as usize];
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let rgb565 = (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3);
        let index = (((y + offset_y) * target_width + x + offset_x) * 2) as usize;
        buffer[index..index + 2].copy_from_slice(&rgb565.to_be_bytes());
    }

    let mut file = File::create(output_path)?;
    file.write_all(&buffer)?;
    println!("cargo:warning=Splash saved to {} ({} bytes)", output_path, buffer.len());
    Ok(())
}

fn main() {
    // Only ESP-IDF builds need the esp-idf-sys link arguments
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let splash_output = format!("{}/splash.bin", out_dir);

    if let Err(e) = convert_image_to_rgb565("splash.png", &splash_output, PANEL_WIDTH, PANEL_HEIGHT) {
        println!("cargo:warning=Failed to convert splash.png: {}", e);
        // Never leave include_bytes! without a file
        let _ = File::create(&splash_output);
    }

    println!("cargo:rerun-if-changed=splash.png");
}
