// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use qimark_core::{
    Channel, Delta, EmbedOutcome, JpegRecompress, Lossless, SearchConfig, WatermarkKey,
};

#[derive(Parser)]
#[command(name = "qimark", about = "Blind DCT-domain image watermarking", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Embed a watermark, raising delta until it reads back reliably
    Embed {
        /// Input image (PNG, JPEG or BMP)
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Integer watermark key
        #[arg(short, long, allow_hyphen_values = true)]
        key: i64,

        /// Initial quantization step (adaptive if omitted)
        #[arg(short, long)]
        delta: Option<f64>,

        /// Verify against JPEG recompression at this quality instead of lossless
        #[arg(long)]
        jpeg_quality: Option<u8>,

        /// Maximum number of delta increments
        #[arg(long, default_value = "10")]
        max_iterations: u32,
    },
    /// Extract the watermark and report its bit error rate
    Extract {
        /// Input image
        #[arg(short, long)]
        input: PathBuf,

        /// Integer watermark key
        #[arg(short, long, allow_hyphen_values = true)]
        key: i64,

        /// Quantization step (adaptive if omitted)
        #[arg(short, long)]
        delta: Option<f64>,

        /// Print the observed bit matrix
        #[arg(long)]
        bits: bool,
    },
    /// Check whether an image carries the watermark of a key
    Detect {
        /// Input image
        #[arg(short, long)]
        input: PathBuf,

        /// Integer watermark key
        #[arg(short, long, allow_hyphen_values = true)]
        key: i64,

        /// Centre of the delta neighborhood (adaptive if omitted)
        #[arg(short, long)]
        delta: Option<f64>,
    },
    /// Embed and extract over a range of deltas and print the BER curve
    Sweep {
        /// Input image
        #[arg(short, long)]
        input: PathBuf,

        /// Integer watermark key
        #[arg(short, long, allow_hyphen_values = true)]
        key: i64,

        #[arg(long, default_value = "2.0")]
        start: f64,

        #[arg(long, default_value = "10.0")]
        end: f64,

        #[arg(long, default_value = "0.25")]
        step: f64,

        /// Measure after JPEG recompression at this quality
        #[arg(long)]
        jpeg_quality: Option<u8>,
    },
    /// Print the SHA-256 content hash of a file
    Hash {
        /// Input file
        input: PathBuf,
    },
}

fn channel(jpeg_quality: Option<u8>) -> Box<dyn Channel> {
    match jpeg_quality {
        Some(q) => Box::new(JpegRecompress::new(q)),
        None => Box::new(Lossless),
    }
}

fn delta(value: Option<f64>) -> Result<Option<Delta>, qimark_core::WatermarkError> {
    value.map(Delta::new).transpose()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Embed {
            input,
            output,
            key,
            delta: initial,
            jpeg_quality,
            max_iterations,
        } => {
            let image = qimark_core::decode_image(&std::fs::read(&input)?)?;
            let config = SearchConfig { max_iterations, ..SearchConfig::default() };
            let channel = channel(jpeg_quality);

            eprintln!(
                "Embedding watermark into {} ({}x{})...",
                input.display(),
                image.width(),
                image.height()
            );
            let outcome = qimark_core::embed_with_search(
                &image,
                WatermarkKey::new(key),
                delta(initial)?,
                &config,
                channel.as_ref(),
            )?;

            match outcome {
                EmbedOutcome::AlreadyWatermarked(det) => {
                    return Err(format!(
                        "{} already carries this watermark (BER {:.4} at delta {})",
                        input.display(),
                        det.ber,
                        det.delta.get()
                    )
                    .into());
                }
                EmbedOutcome::Converged(embedded) => {
                    let bytes = qimark_core::encode_png(&embedded.image)?;
                    qimark_core::write_atomic(&output, &bytes)?;
                    eprintln!(
                        "Done: delta {} after {} attempt(s), BER {:.4}",
                        embedded.delta.get(),
                        embedded.iterations,
                        embedded.ber
                    );
                    println!("{}", qimark_core::content_hash(&bytes));
                }
            }
        }
        Command::Extract { input, key, delta: d, bits } => {
            let image = qimark_core::decode_image(&std::fs::read(&input)?)?;
            let ex = qimark_core::extract(&image, WatermarkKey::new(key), delta(d)?)?;
            println!("delta: {}", ex.delta.get());
            println!("blocks: {}x{}", ex.expected.rows(), ex.expected.cols());
            println!("ber: {:.4}", ex.ber);
            if bits {
                for row in ex.observed.to_rows() {
                    let line: String = row.iter().map(|&b| if b == 1 { '1' } else { '0' }).collect();
                    println!("{line}");
                }
            }
        }
        Command::Detect { input, key, delta: d } => {
            let image = qimark_core::decode_image(&std::fs::read(&input)?)?;
            let det = qimark_core::detect(&image, WatermarkKey::new(key), delta(d)?, &SearchConfig::default())?;
            for (cand, ber) in &det.candidates {
                eprintln!("  delta {cand:>6.2}  ber {ber:.4}");
            }
            if det.watermarked {
                println!("watermarked (BER {:.4} at delta {})", det.ber, det.delta.get());
            } else {
                println!("not watermarked (best BER {:.4})", det.ber);
                std::process::exit(1);
            }
        }
        Command::Sweep {
            input,
            key,
            start,
            end,
            step,
            jpeg_quality,
        } => {
            let image = qimark_core::decode_image(&std::fs::read(&input)?)?;
            let channel = channel(jpeg_quality);
            let sweep =
                qimark_core::sweep_delta(&image, WatermarkKey::new(key), start, end, step, channel.as_ref())?;
            for trial in &sweep.trials {
                println!("{:.2}\t{:.4}", trial.delta, trial.ber);
            }
            eprintln!("best: delta {:.2}, BER {:.4}", sweep.best.delta, sweep.best.ber);
        }
        Command::Hash { input } => {
            println!("{}", qimark_core::content_hash(&std::fs::read(&input)?));
        }
    }

    Ok(())
}
