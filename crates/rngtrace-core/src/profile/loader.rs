//! Profile files.
//!
//! Same layout as an offsets file: the first line is the content hash, the
//! rest are `key = value` pairs with hex addresses. `patchBytes` is a list of
//! hex bytes separated by spaces.
//!
//! ```text
//! B37AB196
//! name = SLPM-87224
//! randFunction = 0x102e8
//! patchAddress = 0x83510
//! patchBytes = 01 80 04 3C A8 12 84 34 ...
//! dataAddress = 0x112a8
//! dataSize = 0x14c
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::warn;

use crate::config::{DEFAULT_CALL_ADDRESS_MASK, DEFAULT_INITIAL_RNG_STATE};
use crate::error::{Error, Result};
use crate::profile::{RedirectEncoding, TargetProfile};

pub fn load_profile<P: AsRef<Path>>(path: P) -> Result<TargetProfile> {
    let content = fs::read_to_string(&path)?;
    parse_profile(&content)
}

pub fn save_profile<P: AsRef<Path>>(path: P, profile: &TargetProfile) -> Result<()> {
    fs::write(path, format_profile(profile))?;
    Ok(())
}

#[derive(Default)]
struct PartialProfile {
    name: Option<String>,
    rand_function: Option<u32>,
    patch_address: Option<u32>,
    patch_bytes: Option<Vec<u8>>,
    data_address: Option<u32>,
    data_size: Option<u32>,
    rng_state: Option<u32>,
    script_rng_state: Option<u32>,
    script_rng_offset_index: Option<u32>,
    script_rng_offsets_base: Option<u32>,
    script_rng_call_site: Option<u32>,
    room: Option<u32>,
    stage: Option<u32>,
    initial_rng_state: Option<u16>,
    call_address_mask: Option<u32>,
    redirect: Option<RedirectEncoding>,
}

pub fn parse_profile(content: &str) -> Result<TargetProfile> {
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with(';'));

    let hash = lines
        .next()
        .ok_or_else(|| Error::ProfileParse("missing hash line".to_string()))?
        .to_string();

    let mut partial = PartialProfile::default();

    for line in lines {
        let Some((key, value)) = line.split_once('=') else {
            warn!("Ignoring malformed profile line: '{}'", line);
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "name" => partial.name = Some(value.to_string()),
            "randfunction" => partial.rand_function = Some(parse_hex_value(value)?),
            "patchaddress" => partial.patch_address = Some(parse_hex_value(value)?),
            "patchbytes" => partial.patch_bytes = Some(parse_byte_list(value)?),
            "dataaddress" => partial.data_address = Some(parse_hex_value(value)?),
            "datasize" => partial.data_size = Some(parse_hex_value(value)?),
            "rngstate" => partial.rng_state = Some(parse_hex_value(value)?),
            "scriptrngstate" => partial.script_rng_state = Some(parse_hex_value(value)?),
            "scriptrngoffsetindex" => {
                partial.script_rng_offset_index = Some(parse_hex_value(value)?)
            }
            "scriptrngoffsetsbase" => {
                partial.script_rng_offsets_base = Some(parse_hex_value(value)?)
            }
            "scriptrngcallsite" => partial.script_rng_call_site = Some(parse_hex_value(value)?),
            "room" => partial.room = Some(parse_hex_value(value)?),
            "stage" => partial.stage = Some(parse_hex_value(value)?),
            "initialrngstate" => {
                let state = parse_hex_value(value)?;
                partial.initial_rng_state = Some(u16::try_from(state).map_err(|_| {
                    Error::ProfileParse(format!("initialRngState {:#x} exceeds 16 bits", state))
                })?);
            }
            "calladdressmask" => partial.call_address_mask = Some(parse_hex_value(value)?),
            "redirect" => {
                partial.redirect = Some(RedirectEncoding::from_str(value).map_err(|_| {
                    Error::ProfileParse(format!("unknown redirect encoding '{}'", value))
                })?)
            }
            _ => {
                warn!("Unknown profile key: '{}' (value: {})", key, value);
            }
        }
    }

    let profile = TargetProfile {
        name: partial.name.unwrap_or_else(|| hash.clone()),
        rand_function: required(partial.rand_function, "randFunction")?,
        patch_address: required(partial.patch_address, "patchAddress")?,
        patch_bytes: required(partial.patch_bytes, "patchBytes")?,
        data_address: required(partial.data_address, "dataAddress")?,
        data_size: required(partial.data_size, "dataSize")?,
        rng_state: required(partial.rng_state, "rngState")?,
        script_rng_state: required(partial.script_rng_state, "scriptRngState")?,
        script_rng_offset_index: required(
            partial.script_rng_offset_index,
            "scriptRngOffsetIndex",
        )?,
        script_rng_offsets_base: required(
            partial.script_rng_offsets_base,
            "scriptRngOffsetsBase",
        )?,
        script_rng_call_site: required(partial.script_rng_call_site, "scriptRngCallSite")?,
        room: required(partial.room, "room")?,
        stage: required(partial.stage, "stage")?,
        initial_rng_state: partial
            .initial_rng_state
            .unwrap_or(DEFAULT_INITIAL_RNG_STATE),
        call_address_mask: partial
            .call_address_mask
            .unwrap_or(DEFAULT_CALL_ADDRESS_MASK),
        redirect: partial.redirect.unwrap_or_default(),
        hash,
    };

    profile.validate()?;
    Ok(profile)
}

pub fn format_profile(profile: &TargetProfile) -> String {
    let patch_bytes = profile
        .patch_bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ");

    let lines = [
        profile.hash.clone(),
        format!("name = {}", profile.name),
        format!("randFunction = {:#x}", profile.rand_function),
        format!("patchAddress = {:#x}", profile.patch_address),
        format!("patchBytes = {}", patch_bytes),
        format!("dataAddress = {:#x}", profile.data_address),
        format!("dataSize = {:#x}", profile.data_size),
        format!("rngState = {:#x}", profile.rng_state),
        format!("scriptRngState = {:#x}", profile.script_rng_state),
        format!("scriptRngOffsetIndex = {:#x}", profile.script_rng_offset_index),
        format!("scriptRngOffsetsBase = {:#x}", profile.script_rng_offsets_base),
        format!("scriptRngCallSite = {:#x}", profile.script_rng_call_site),
        format!("room = {:#x}", profile.room),
        format!("stage = {:#x}", profile.stage),
        format!("initialRngState = {:#x}", profile.initial_rng_state),
        format!("callAddressMask = {:#x}", profile.call_address_mask),
        format!("redirect = {}", profile.redirect),
    ];

    lines.join("\n")
}

fn required<T>(value: Option<T>, key: &str) -> Result<T> {
    value.ok_or_else(|| Error::ProfileParse(format!("missing required key '{}'", key)))
}

fn parse_hex_value(value: &str) -> Result<u32> {
    let value = value.trim();
    // Strip hex prefix (case-insensitive), only once
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    u32::from_str_radix(digits, 16)
        .map_err(|e| Error::ProfileParse(format!("Failed to parse '{}': {}", value, e)))
}

fn parse_byte_list(value: &str) -> Result<Vec<u8>> {
    value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            u8::from_str_radix(digits, 16)
                .map_err(|e| Error::ProfileParse(format!("Invalid patch byte '{}': {}", token, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::InstrumentationRecipe;

    #[test]
    fn test_format_then_parse_builtin() {
        let profile = TargetProfile::slpm_87224();
        let parsed = parse_profile(&format_profile(&profile)).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn test_parse_minimal_profile_uses_defaults() {
        let content = "\
            # custom dump\n\
            abcd0001\n\
            randFunction = 0x102E8\n\
            patchAddress = 0x83510\n\
            patchBytes = 00 00 00 00, 0x08 00 00 08\n\
            dataAddress = 0x112A8\n\
            dataSize = 0x20\n\
            rngState = 9A928\n\
            scriptRngState = 0xD3222\n\
            scriptRngOffsetIndex = 0xE142E\n\
            scriptRngOffsetsBase = 0x9A950\n\
            scriptRngCallSite = 0x52F2C\n\
            room = 0xD3218\n\
            stage = 0xD3216\n";

        let profile = parse_profile(content).unwrap();
        assert_eq!(profile.hash, "abcd0001");
        assert_eq!(profile.name, "abcd0001");
        assert_eq!(profile.patch_bytes, vec![0, 0, 0, 0, 0x08, 0, 0, 0x08]);
        assert_eq!(profile.data_size, 0x20);
        assert_eq!(profile.rng_state, 0x9A928);
        assert_eq!(profile.initial_rng_state, DEFAULT_INITIAL_RNG_STATE);
        assert_eq!(profile.call_address_mask, DEFAULT_CALL_ADDRESS_MASK);
        assert_eq!(profile.redirect, RedirectEncoding::MipsJ);
    }

    #[test]
    fn test_parse_missing_key() {
        let content = "B37AB196\nname = x\nrandFunction = 0x102E8\n";
        let err = parse_profile(content).unwrap_err();
        assert!(err.to_string().contains("patchAddress"));
    }

    #[test]
    fn test_parse_empty_content() {
        assert!(matches!(parse_profile(""), Err(Error::ProfileParse(_))));
    }

    #[test]
    fn test_parse_rejects_bad_redirect() {
        let mut content = format_profile(&TargetProfile::slpm_87224());
        content = content.replace("redirect = mips-j", "redirect = arm-b");
        assert!(matches!(parse_profile(&content), Err(Error::ProfileParse(_))));
    }

    #[test]
    fn test_parse_rejects_overlapping_profile() {
        let mut content = format_profile(&TargetProfile::slpm_87224());
        content = content.replace("patchAddress = 0x83510", "patchAddress = 0x112a8");
        assert!(matches!(parse_profile(&content), Err(Error::InvalidProfile(_))));
    }

    #[test]
    fn test_parse_rejects_buffer_past_address_space() {
        let content = format_profile(&TargetProfile::slpm_87224())
            .replace("dataAddress = 0x112a8", "dataAddress = 0xffffff00")
            .replace("dataSize = 0x14c", "dataSize = 0x100");
        let err = parse_profile(&content).unwrap_err();
        assert!(matches!(err, Error::InvalidProfile(_)));
        assert!(err.to_string().contains("capture buffer"));
    }

    #[test]
    fn test_parse_accepts_guard_at_top_of_address_space() {
        let content = format_profile(&TargetProfile::slpm_87224())
            .replace("dataAddress = 0x112a8", "dataAddress = 0xfffffefc")
            .replace("dataSize = 0x14c", "dataSize = 0x100");
        let profile = parse_profile(&content).unwrap();
        assert_eq!(profile.capture_buffer().guard_address(), 0xFFFF_FFFC);
    }

    #[test]
    fn test_parse_rejects_patch_past_address_space() {
        let content = format_profile(&TargetProfile::slpm_87224())
            .replace("patchAddress = 0x83510", "patchAddress = 0xfffffffc");
        assert!(matches!(parse_profile(&content), Err(Error::InvalidProfile(_))));

        let content = format_profile(&TargetProfile::slpm_87224())
            .replace("randFunction = 0x102e8", "randFunction = 0xfffffffe");
        assert!(matches!(parse_profile(&content), Err(Error::InvalidProfile(_))));
    }

    #[test]
    fn test_parse_hex_value() {
        assert_eq!(parse_hex_value("0x1A").unwrap(), 0x1A);
        assert_eq!(parse_hex_value("0X1a").unwrap(), 0x1A);
        assert_eq!(parse_hex_value("ff").unwrap(), 0xFF);
        assert!(parse_hex_value("0xZZ").is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.txt");
        let profile = TargetProfile::slpm_87224();

        save_profile(&path, &profile).unwrap();
        assert_eq!(load_profile(&path).unwrap(), profile);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_profile(dir.path().join("nope.txt")).unwrap_err();
        assert!(err.is_not_found());
    }
}
