// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::env;

const FALLBACK_ENDPOINT: &str = "https://healthcheck-backend-g2hd.onrender.com";

fn main() {
    println!("cargo:rerun-if-env-changed=LABELSCAN_ENDPOINT");
    let endpoint = env::var("LABELSCAN_ENDPOINT")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_ENDPOINT.to_owned());
    println!("cargo:rustc-env=LABELSCAN_ENDPOINT={endpoint}");
}
