use super::*;
use crate::error::{AppError, AppResult, ValidationError};
use clap::Parser;
use std::time::Duration;

fn parse(args: &[&str]) -> AppResult<BenchArgs> {
    BenchArgs::try_parse_from(args).map_err(AppError::from)
}

#[test]
fn defaults_match_documented_values() -> AppResult<()> {
    let args = parse(&["cxbench", "localhost:8080"])?;
    let target = args
        .target
        .ok_or_else(|| AppError::validation("Expected target"))?;
    if target.host != "localhost" || target.port != 8080 {
        return Err(AppError::validation(format!("Unexpected target {}", target)));
    }
    if args.parallel.get() != 1 {
        return Err(AppError::validation("Expected parallel = 1"));
    }
    if args.rate.to_bits() != 0.0_f64.to_bits() {
        return Err(AppError::validation("Expected unbounded rate"));
    }
    if args.wait_mode != WaitMode::Poisson || args.backend != BackendKind::Auto {
        return Err(AppError::validation("Unexpected wait mode or backend"));
    }
    if args.loop_mode || args.random || args.post {
        return Err(AppError::validation("Expected flags off"));
    }
    if args.output.to_str() != Some(DEFAULT_QUERY_LOG)
        || args.errors.to_str() != Some(DEFAULT_ERROR_LOG)
    {
        return Err(AppError::validation("Unexpected log paths"));
    }
    if args.probe_timeout != Duration::from_secs(5) {
        return Err(AppError::validation("Unexpected probe timeout"));
    }
    if args.max_queries.is_some() || args.header.is_some() || args.debug != 0 {
        return Err(AppError::validation("Unexpected optional values"));
    }
    Ok(())
}

#[test]
fn short_flags_and_aliases() -> AppResult<()> {
    let args = parse(&[
        "cxbench",
        "-p",
        "16",
        "-r",
        "250.5",
        "--wait-mode",
        "REGULAR",
        "-l",
        "--randomize",
        "-n",
        "1000",
        "-H",
        "X-Bench: 1",
        "-dd",
        "127.0.0.1:80",
    ])?;
    if args.parallel.get() != 16 {
        return Err(AppError::validation("Expected parallel = 16"));
    }
    if (args.rate - 250.5).abs() > f64::EPSILON {
        return Err(AppError::validation("Unexpected rate"));
    }
    if args.wait_mode != WaitMode::Regular || !args.loop_mode || !args.random {
        return Err(AppError::validation("Unexpected scheduling flags"));
    }
    if args.max_queries.map(PositiveU64::get) != Some(1000) {
        return Err(AppError::validation("Unexpected max queries"));
    }
    if args.header.as_deref() != Some("X-Bench: 1") {
        return Err(AppError::validation("Unexpected header"));
    }
    if args.debug != 2 {
        return Err(AppError::validation("Expected debug count 2"));
    }
    let concurrency = parse(&["cxbench", "--concurrency", "3", "h:1"])?;
    if concurrency.parallel.get() != 3 {
        return Err(AppError::validation("Expected concurrency alias"));
    }
    Ok(())
}

#[test]
fn rejects_zero_parallel_and_negative_rate() -> AppResult<()> {
    if parse(&["cxbench", "-p", "0", "h:1"]).is_ok() {
        return Err(AppError::validation("Expected zero parallel to fail"));
    }
    if parse(&["cxbench", "-r", "-1", "h:1"]).is_ok() {
        return Err(AppError::validation("Expected negative rate to fail"));
    }
    if parse(&["cxbench", "--decay-factor", "1.0", "h:1"]).is_ok() {
        return Err(AppError::validation("Expected decay factor 1.0 to fail"));
    }
    Ok(())
}

#[test]
fn target_forms() -> AppResult<()> {
    let v6: TargetSpec = "[::1]:8443".parse()?;
    if v6.host != "::1" || v6.port != 8443 || v6.to_string() != "[::1]:8443" {
        return Err(AppError::validation(format!("Unexpected v6 target {:?}", v6)));
    }
    let named: TargetSpec = " example.com:80 ".parse()?;
    if named.host != "example.com" || named.port != 80 {
        return Err(AppError::validation("Unexpected named target"));
    }
    match "localhost".parse::<TargetSpec>() {
        Err(ValidationError::InvalidTargetFormat { .. }) => {}
        Err(other) => return Err(AppError::validation(format!("Unexpected error {}", other))),
        Ok(_) => return Err(AppError::validation("Expected missing port to fail")),
    }
    match ":80".parse::<TargetSpec>() {
        Err(ValidationError::TargetHostEmpty { .. }) => {}
        Err(other) => return Err(AppError::validation(format!("Unexpected error {}", other))),
        Ok(_) => return Err(AppError::validation("Expected empty host to fail")),
    }
    match "host:99999".parse::<TargetSpec>() {
        Err(ValidationError::InvalidTargetPort { .. }) => {}
        Err(other) => return Err(AppError::validation(format!("Unexpected error {}", other))),
        Ok(_) => return Err(AppError::validation("Expected bad port to fail")),
    }
    if "::1:80".parse::<TargetSpec>().is_ok() {
        return Err(AppError::validation("Expected unbracketed v6 to fail"));
    }
    Ok(())
}

#[test]
fn header_line_must_be_single_key_value() -> AppResult<()> {
    if parse_header_line("Cookie: a=b")? != "Cookie: a=b" {
        return Err(AppError::validation("Unexpected header value"));
    }
    match parse_header_line("X: a\r\nEvil: 1") {
        Err(ValidationError::HeaderContainsLineBreak { .. }) => {}
        Err(other) => return Err(AppError::validation(format!("Unexpected error {}", other))),
        Ok(_) => return Err(AppError::validation("Expected CRLF header to fail")),
    }
    if parse_header_line(": value").is_ok() || parse_header_line("novalue").is_ok() {
        return Err(AppError::validation("Expected malformed header to fail"));
    }
    Ok(())
}

#[test]
fn prefix_rejects_whitespace() -> AppResult<()> {
    if parse_prefix("/search?q=")? != "/search?q=" {
        return Err(AppError::validation("Unexpected prefix"));
    }
    if parse_prefix("/a b").is_ok() || parse_prefix("/a\n").is_ok() {
        return Err(AppError::validation("Expected whitespace prefix to fail"));
    }
    Ok(())
}

#[test]
fn duration_units() -> AppResult<()> {
    if parse_duration_arg("250ms")? != Duration::from_millis(250) {
        return Err(AppError::validation("Unexpected ms duration"));
    }
    if parse_duration_arg("3")? != Duration::from_secs(3) {
        return Err(AppError::validation("Unexpected default unit"));
    }
    if parse_duration_arg("2m")? != Duration::from_secs(120) {
        return Err(AppError::validation("Unexpected minute duration"));
    }
    if parse_duration_arg("1h")? != Duration::from_secs(3600) {
        return Err(AppError::validation("Unexpected hour duration"));
    }
    match parse_duration_arg("0s") {
        Err(ValidationError::DurationZero) => {}
        Err(other) => return Err(AppError::validation(format!("Unexpected error {}", other))),
        Ok(_) => return Err(AppError::validation("Expected zero duration to fail")),
    }
    match parse_duration_arg("5d") {
        Err(ValidationError::InvalidDurationUnit { unit }) if unit == "d" => {}
        Err(other) => return Err(AppError::validation(format!("Unexpected error {}", other))),
        Ok(_) => return Err(AppError::validation("Expected unknown unit to fail")),
    }
    Ok(())
}

#[test]
fn auto_backend_resolves_to_concrete() -> AppResult<()> {
    let resolved = BackendKind::Auto.resolve();
    if resolved == BackendKind::Auto {
        return Err(AppError::validation("Auto must resolve to a concrete backend"));
    }
    if BackendKind::Poll.resolve() != BackendKind::Poll {
        return Err(AppError::validation("Explicit backend must stay unchanged"));
    }
    if "EPOLL".parse::<BackendKind>()? != BackendKind::Epoll {
        return Err(AppError::validation("Expected case-insensitive backend"));
    }
    Ok(())
}
