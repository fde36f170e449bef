use anyhow::Context;
use serde::Serialize;
use textlens_lib::models::{AnalysisResult, OwnerId};
use textlens_lib::services::text_processor::{extract_upload_text, preview_chars};

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  cargo run --bin highlight_file -- <path.txt|path.pdf> [--segments <n>] [--owner <id>] [--out <json_path>]\n\nNotes:\n  - The scoring provider is read from the regular config file and environment (SCORING_API_KEY, SCORING_API_URL, SCORING_MODEL).\n  - With --owner the analysis is also written to the history store."
        );
        return Ok(());
    }

    let path = args[1].clone();
    let segments_n: usize = parse_arg_value(&args, "--segments")
        .and_then(|s| s.parse().ok())
        .unwrap_or(50);
    let owner = parse_arg_value(&args, "--owner").map(OwnerId);
    let out_path = parse_arg_value(&args, "--out");

    let bytes = std::fs::read(&path).with_context(|| format!("read file failed: {}", path))?;
    let file_name = std::path::Path::new(&path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "input.txt".to_string());

    let text = extract_upload_text(&file_name, None, &bytes)?;

    let config = textlens_lib::load_config()?;
    let analyzer = textlens_lib::build_analyzer(&config)?;

    println!("File: {}", path);
    println!("Extracted: {} chars ({} bytes)", text.chars().count(), text.len());
    println!("Provider: {} ({})", config.provider.model, config.provider.base_url);
    println!();

    let result: AnalysisResult = analyzer
        .analyze(&text, owner)
        .await
        .map_err(|e| anyhow::anyhow!("{} ({})", e.public_message(), e))?;

    let scores = result.scores();
    println!(
        "AI: {}%  Human: {}%  Plagiarism: {}%",
        scores.ai_score, scores.human_score, scores.plagiarism_score
    );
    if !result.ai_reasoning.is_empty() {
        println!("AI reasoning: {}", result.ai_reasoning);
    }
    if !result.plagiarism_reasoning.is_empty() {
        println!("Plagiarism reasoning: {}", result.plagiarism_reasoning);
    }
    println!();

    println!("Segments: {}", result.highlighted_text.len());
    let mut offset = 0usize;
    for (i, seg) in result.highlighted_text.iter().take(segments_n).enumerate() {
        println!(
            "[S{:04}] {:<10} bytes=[{},{}]  {}",
            i,
            seg.kind.to_string(),
            offset,
            offset + seg.text.len(),
            preview_chars(&seg.text, 120)
        );
        offset += seg.text.len();
    }
    if result.highlighted_text.len() > segments_n {
        println!("... ({} more segments)", result.highlighted_text.len() - segments_n);
    }

    if let Some(out_path) = out_path {
        #[derive(Serialize)]
        struct Output<'a> {
            file: &'a str,
            extracted_chars: usize,
            extracted_bytes: usize,
            #[serde(flatten)]
            result: &'a AnalysisResult,
        }

        let out = Output {
            file: &path,
            extracted_chars: text.chars().count(),
            extracted_bytes: text.len(),
            result: &result,
        };

        let json = serde_json::to_string_pretty(&out)?;
        std::fs::write(&out_path, json).with_context(|| format!("write out failed: {}", out_path))?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
