//! Offline check of an ad creation request against a stored ad set document.
//!
//! Usage: `check_ad_request <ad_request.json> [adset_record.json]`
//!
//! Prints the Graph API body the request would produce, or the rejection.

use std::env;
use std::fs;
use std::process::ExitCode;

use anyhow::Context;
use rust_fb_ads_api::errors::ErrorCategory;
use rust_fb_ads_api::models::{AdRequest, AdSetRecord};
use rust_fb_ads_api::normalizer::validate_and_normalize_ad;

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))
}

fn main() -> anyhow::Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(request_path) = args.first() else {
        eprintln!("Usage: check_ad_request <ad_request.json> [adset_record.json]");
        return Ok(ExitCode::from(2));
    };

    let request: AdRequest = read_json(request_path)?;
    let adset: Option<AdSetRecord> = args.get(1).map(|p| read_json(p)).transpose()?;

    match validate_and_normalize_ad(&request, adset.as_ref()) {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let hint = match e.category() {
                ErrorCategory::Request => "fix the request",
                ErrorCategory::Integrity => "sync the ad set to Facebook first",
            };
            eprintln!("✗ {} ({})", e, hint);
            Ok(ExitCode::FAILURE)
        }
    }
}
