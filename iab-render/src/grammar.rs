// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The renderer configuration text grammar (spec §6): a line-oriented, one-letter-directive
//! format. Parsing is two-pass, matching `original_source/RendererConfigurationFile.cpp`: speaker
//! declarations and global flags are consumed first, then downmix/LFE/patch directives, which
//! reference speakers by name, are consumed second (spec SPEC_FULL.md "Supplemented features").
//!
//! No external grammar crate (`nom`, `pest`) is used; this is a small hand-rolled line parser,
//! matching how `symphonia-metadata`'s tag readers handle their own bespoke line/tag formats.

use iab_core::errors::{renderer_config_error, Result};

use crate::config::{ConfigBuilder, RendererConfig};

/// Parses a complete renderer configuration text block (spec §6).
pub fn parse_config(text: &str) -> Result<RendererConfig> {
    let lines: Vec<Line<'_>> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(split_directive)
        .collect::<Result<_>>()?;

    let mut builder = ConfigBuilder::new();

    // First pass: version, flags, soundfield URI, authoring-tool metadata, speakers.
    let mut deferred = Vec::new();
    for line in &lines {
        match line.directive {
            "V" => builder.set_version(parse_u32(line.arg(0)?)?),
            "C" => apply_flag(&mut builder, line)?,
            "E" => builder.set_soundfield_uri(line.arg(0)?.to_string()),
            "S" => add_speaker(&mut builder, line)?,
            "K" => apply_metadata(&mut builder, line)?,
            "W" | "M" | "P" => deferred.push(line),
            _ => return renderer_config_error("unrecognised renderer configuration directive"),
        }
    }

    // Second pass: directives that reference already-declared speakers by name.
    for line in deferred {
        match line.directive {
            "W" => builder.set_lfe(line.arg(0)?)?,
            "M" => add_downmix(&mut builder, line)?,
            "P" => builder.add_patch(line.arg(0)?, line.arg(1)?, line.arg(2)?)?,
            _ => unreachable!("deferred lines only ever carry W, M or P"),
        }
    }

    builder.build()
}

struct Line<'a> {
    directive: &'a str,
    args: Vec<&'a str>,
}

impl<'a> Line<'a> {
    fn arg(&self, index: usize) -> Result<&'a str> {
        self.args
            .get(index)
            .copied()
            .ok_or_else(|| iab_core::errors::IabError::RendererConfig("directive is missing a required argument"))
    }
}

fn split_directive(line: &str) -> Result<Line<'_>> {
    let mut tokens = line.split_whitespace();
    let directive = tokens
        .next()
        .ok_or_else(|| iab_core::errors::IabError::RendererConfig("empty configuration line"))?;
    Ok(Line { directive, args: tokens.collect() })
}

fn parse_u32(token: &str) -> Result<u32> {
    token.parse().map_err(|_| iab_core::errors::IabError::RendererConfig("expected an integer"))
}

fn parse_f32(token: &str) -> Result<f32> {
    token.parse().map_err(|_| iab_core::errors::IabError::RendererConfig("expected a floating-point number"))
}

fn parse_bool(token: &str) -> Result<bool> {
    match token {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => renderer_config_error("expected a boolean (true/false)"),
    }
}

/// `C SMOOTH|DECORR|IABDECORR|DEBUG bool` (spec §6).
fn apply_flag(builder: &mut ConfigBuilder, line: &Line<'_>) -> Result<()> {
    let name = line.arg(0)?;
    let value = parse_bool(line.arg(1)?)?;
    builder.set_flag(name, value)
}

/// `K AUTHTOOL|AUTHTOOLVERSION|RPVERSION <str>` (spec §6).
fn apply_metadata(builder: &mut ConfigBuilder, line: &Line<'_>) -> Result<()> {
    let key = line.arg(0)?;
    let value = line.args[1..].join(" ");
    match key {
        "AUTHTOOL" => builder.set_authoring_tool(value),
        "AUTHTOOLVERSION" => builder.set_authoring_tool_version(value),
        "RPVERSION" => builder.set_rp_version(value),
        _ => return renderer_config_error("unrecognised `K` metadata key"),
    }
    Ok(())
}

/// `S <name> <chan|*> <az> <el> [uri]` (spec §6). `chan` is a zero-based output channel index;
/// `*` declares a virtual speaker with no physical output.
fn add_speaker(builder: &mut ConfigBuilder, line: &Line<'_>) -> Result<()> {
    let name = line.arg(0)?;
    let output = line.arg(1)?;
    let output_index = if output == "*" { None } else { Some(parse_u32(output)? as usize) };
    let azimuth = parse_f32(line.arg(2)?)?;
    let elevation = parse_f32(line.arg(3)?)?;
    let uri = line.args.get(4).copied();
    builder.add_speaker(name, output_index, azimuth, elevation, uri)
}

/// `M <src> (<dst> <coef>)+` (spec §6).
fn add_downmix(builder: &mut ConfigBuilder, line: &Line<'_>) -> Result<()> {
    let source = line.arg(0)?;
    let rest = &line.args[1..];
    if rest.is_empty() || rest.len() % 2 != 0 {
        return renderer_config_error("`M` directive needs one or more (target, coefficient) pairs");
    }
    let mut targets = Vec::with_capacity(rest.len() / 2);
    for pair in rest.chunks(2) {
        targets.push((pair[0], parse_f32(pair[1])?));
    }
    builder.add_downmix(source, &targets)
}
