// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Renderer configuration: speakers, VBAP patches, downmix maps and the LFE designation (spec
//! §4.F). Built once via [`ConfigBuilder`] and held immutable for the renderer's lifetime.

use iab_core::errors::{renderer_config_error, IabError, Result};

/// One physical or virtual output of the renderer (spec §4.F, `original_source/RenderSpeaker.cpp`:
/// a speaker carries a name, azimuth/elevation, an output index or "virtual", and a VBAP/non-VBAP
/// classification derived from patch membership rather than declared up front).
#[derive(Debug, Clone, PartialEq)]
pub struct Speaker {
    pub name: String,
    /// `None` for a virtual speaker (declared with `*` in the text grammar, spec §6).
    pub output_index: Option<usize>,
    pub azimuth_deg: f32,
    pub elevation_deg: f32,
    pub uri: Option<String>,
    /// Unit-sphere direction derived from `(azimuth_deg, elevation_deg)` at build time.
    pub direction: [f32; 3],
    /// Set once every patch has been added: true if this speaker is a vertex of at least one
    /// VBAP patch (spec §4.F "A speaker that is a vertex in any patch is marked VBAP").
    pub is_vbap: bool,
}

/// Maps `(azimuth, elevation)` in degrees to a unit-sphere direction (spec §4.F): `x = sin θ cos
/// φ`, `y = cos θ cos φ`, `z = sin φ`, each clamped to `[-1, 1]`.
pub fn direction_from_az_el(azimuth_deg: f32, elevation_deg: f32) -> [f32; 3] {
    let theta = azimuth_deg.to_radians();
    let phi = elevation_deg.to_radians();
    [
        (theta.sin() * phi.cos()).clamp(-1.0, 1.0),
        (theta.cos() * phi.cos()).clamp(-1.0, 1.0),
        phi.sin().clamp(-1.0, 1.0),
    ]
}

/// A row-major 3x3 matrix, just enough linear algebra for VBAP's per-patch position matrix and
/// its precomputed inverse (spec §4.F; no accelerated or general-purpose linear algebra crate
/// appears anywhere in the example pack, so this stays a small hand-rolled type rather than
/// pulling one in).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub rows: [[f32; 3]; 3],
}

impl Mat3 {
    pub fn from_columns(c0: [f32; 3], c1: [f32; 3], c2: [f32; 3]) -> Self {
        Mat3 {
            rows: [[c0[0], c1[0], c2[0]], [c0[1], c1[1], c2[1]], [c0[2], c1[2], c2[2]]],
        }
    }

    pub fn determinant(&self) -> f32 {
        let [[a, b, c], [d, e, f], [g, h, i]] = self.rows;
        a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g)
    }

    /// Returns `None` if the matrix is singular within `eps` (spec §4.F "non-singular 3x3
    /// position matrix (determinant magnitude > ε)").
    pub fn inverse(&self, eps: f32) -> Option<Mat3> {
        let det = self.determinant();
        if det.abs() <= eps {
            return None;
        }
        let [[a, b, c], [d, e, f], [g, h, i]] = self.rows;
        let inv_det = 1.0 / det;
        Some(Mat3 {
            rows: [
                [(e * i - f * h) * inv_det, (c * h - b * i) * inv_det, (b * f - c * e) * inv_det],
                [(f * g - d * i) * inv_det, (a * i - c * g) * inv_det, (c * d - a * f) * inv_det],
                [(d * h - e * g) * inv_det, (b * g - a * h) * inv_det, (a * e - b * d) * inv_det],
            ],
        })
    }

    pub fn mul_vec(&self, v: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0f32; 3];
        for (row, o) in self.rows.iter().zip(out.iter_mut()) {
            *o = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
        }
        out
    }
}

/// A VBAP patch: three speakers forming a triangle on the unit sphere, with its position matrix's
/// inverse precomputed at build time (spec §4.F, §4.G step 1).
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub speakers: [usize; 3],
    pub inverse: Mat3,
}

/// A downmix entry: redistribute one speaker's energy onto others (spec §4.F, §4.H step 5 — rare,
/// primarily for a configured speaker that is absent from the physical output set).
#[derive(Debug, Clone, PartialEq)]
pub struct Downmix {
    pub source: usize,
    /// Raw, as-declared coefficients, retained for inspection (spec §4.F "the unnormalised ones
    /// are also retained").
    pub targets_raw: Vec<(usize, f32)>,
    /// L2-normalised coefficients, what the renderer actually applies.
    pub targets_normalized: Vec<(usize, f32)>,
}

/// Renderer configuration flags from the `C` directive (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigFlags {
    pub smooth: bool,
    pub decorr: bool,
    pub iab_decorr: bool,
    pub debug: bool,
}

/// A fully built, immutable renderer configuration (spec §4.F).
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    pub version: u32,
    pub flags: ConfigFlags,
    pub soundfield_uri: Option<String>,
    pub speakers: Vec<Speaker>,
    pub patches: Vec<Patch>,
    pub downmixes: Vec<Downmix>,
    pub lfe_speaker: Option<usize>,
    pub authoring_tool: Option<String>,
    pub authoring_tool_version: Option<String>,
    pub rp_version: Option<String>,
}

impl RendererConfig {
    pub fn speaker_by_name(&self, name: &str) -> Option<usize> {
        self.speakers.iter().position(|s| s.name == name)
    }

    pub fn downmix_for(&self, speaker_index: usize) -> Option<&Downmix> {
        self.downmixes.iter().find(|d| d.source == speaker_index)
    }
}

const PATCH_DETERMINANT_EPS: f32 = 1e-6;

/// Two-pass builder matching `original_source/RendererConfigurationFile.cpp`'s grammar: speakers
/// and global flags are added first; downmixes, the LFE designation and VBAP patches reference
/// speakers by name and are added second. The builder enforces this by validating references
/// immediately rather than tracking an explicit "pass" state.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    version: u32,
    flags: ConfigFlags,
    soundfield_uri: Option<String>,
    speakers: Vec<Speaker>,
    patches: Vec<Patch>,
    downmixes: Vec<Downmix>,
    lfe_speaker: Option<usize>,
    authoring_tool: Option<String>,
    authoring_tool_version: Option<String>,
    rp_version: Option<String>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder::default()
    }

    pub fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    pub fn set_flags(&mut self, flags: ConfigFlags) {
        self.flags = flags;
    }

    /// Sets one named flag (spec §6 `C` directive), leaving the others at whatever they were
    /// previously set to. Unrecognised names are a configuration error.
    pub fn set_flag(&mut self, name: &str, value: bool) -> Result<()> {
        match name {
            "SMOOTH" => self.flags.smooth = value,
            "DECORR" => self.flags.decorr = value,
            "IABDECORR" => self.flags.iab_decorr = value,
            "DEBUG" => self.flags.debug = value,
            _ => return renderer_config_error("unrecognised configuration flag name"),
        }
        Ok(())
    }

    pub fn set_soundfield_uri(&mut self, uri: String) {
        self.soundfield_uri = Some(uri);
    }

    pub fn set_authoring_tool(&mut self, value: String) {
        self.authoring_tool = Some(value);
    }

    pub fn set_authoring_tool_version(&mut self, value: String) {
        self.authoring_tool_version = Some(value);
    }

    pub fn set_rp_version(&mut self, value: String) {
        self.rp_version = Some(value);
    }

    /// Adds a speaker (spec §4.F). Enforces name/output-index/URI uniqueness and the azimuth /
    /// elevation ranges.
    pub fn add_speaker(&mut self, name: &str, output_index: Option<usize>, azimuth_deg: f32, elevation_deg: f32, uri: Option<&str>) -> Result<()> {
        if self.speakers.iter().any(|s| s.name == name) {
            return renderer_config_error("duplicate speaker name");
        }
        if let Some(idx) = output_index {
            if self.speakers.iter().any(|s| s.output_index == Some(idx)) {
                return renderer_config_error("duplicate physical output channel index");
            }
        }
        if let Some(u) = uri {
            if !u.is_empty() && self.speakers.iter().any(|s| s.uri.as_deref() == Some(u)) {
                return renderer_config_error("duplicate non-empty speaker URI");
            }
        }
        if !(-360.0..=360.0).contains(&azimuth_deg) {
            return renderer_config_error("speaker azimuth out of range");
        }
        if !(-90.0..=90.0).contains(&elevation_deg) {
            return renderer_config_error("speaker elevation out of range");
        }

        self.speakers.push(Speaker {
            name: name.to_string(),
            output_index,
            azimuth_deg,
            elevation_deg,
            uri: uri.filter(|u| !u.is_empty()).map(str::to_string),
            direction: direction_from_az_el(azimuth_deg, elevation_deg),
            is_vbap: false,
        });
        Ok(())
    }

    /// Designates the LFE speaker by name (spec §6 `W` directive).
    pub fn set_lfe(&mut self, name: &str) -> Result<()> {
        let idx = self.find_speaker(name)?;
        self.lfe_speaker = Some(idx);
        Ok(())
    }

    /// Adds a downmix entry: `source`'s energy is redistributed onto `targets`, each a
    /// `(speaker name, non-negative coefficient)` pair whose speaker must be a non-virtual
    /// speaker (spec §4.F).
    pub fn add_downmix(&mut self, source: &str, targets: &[(&str, f32)]) -> Result<()> {
        let source_idx = self.find_speaker(source)?;
        let mut targets_raw = Vec::with_capacity(targets.len());
        for &(name, coeff) in targets {
            if coeff < 0.0 {
                return renderer_config_error("downmix coefficient must be non-negative");
            }
            let idx = self.find_speaker(name)?;
            if self.speakers[idx].output_index.is_none() {
                return renderer_config_error("downmix target must be a non-virtual speaker");
            }
            targets_raw.push((idx, coeff));
        }

        let norm = (targets_raw.iter().map(|&(_, c)| c * c).sum::<f32>()).sqrt();
        let targets_normalized = if norm > 0.0 {
            targets_raw.iter().map(|&(idx, c)| (idx, c / norm)).collect()
        }
        else {
            targets_raw.clone()
        };

        self.downmixes.push(Downmix { source: source_idx, targets_raw, targets_normalized });
        Ok(())
    }

    /// Adds a VBAP patch over three named speakers (spec §4.F, §4.G step 1).
    pub fn add_patch(&mut self, s1: &str, s2: &str, s3: &str) -> Result<()> {
        let i0 = self.find_speaker(s1)?;
        let i1 = self.find_speaker(s2)?;
        let i2 = self.find_speaker(s3)?;

        let matrix = Mat3::from_columns(self.speakers[i0].direction, self.speakers[i1].direction, self.speakers[i2].direction);
        let inverse = matrix
            .inverse(PATCH_DETERMINANT_EPS)
            .ok_or_else(|| IabError::RendererConfig("VBAP patch position matrix is singular"))?;

        self.patches.push(Patch { speakers: [i0, i1, i2], inverse });
        Ok(())
    }

    fn find_speaker(&self, name: &str) -> Result<usize> {
        self.speakers
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| IabError::RendererConfig("renderer configuration references an undeclared speaker"))
    }

    /// Finalises the configuration: classifies every speaker that is a patch vertex as VBAP, and
    /// returns the immutable [`RendererConfig`] (spec §4.F).
    pub fn build(mut self) -> Result<RendererConfig> {
        for patch in &self.patches {
            for &idx in &patch.speakers {
                self.speakers[idx].is_vbap = true;
            }
        }
        Ok(RendererConfig {
            version: self.version,
            flags: self.flags,
            soundfield_uri: self.soundfield_uri,
            speakers: self.speakers,
            patches: self.patches,
            downmixes: self.downmixes,
            lfe_speaker: self.lfe_speaker,
            authoring_tool: self.authoring_tool,
            authoring_tool_version: self.authoring_tool_version,
            rp_version: self.rp_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symmetric_5_1_builder() -> ConfigBuilder {
        let mut b = ConfigBuilder::new();
        b.add_speaker("L", Some(0), -30.0, 0.0, None).unwrap();
        b.add_speaker("C", Some(1), 0.0, 0.0, None).unwrap();
        b.add_speaker("R", Some(2), 30.0, 0.0, None).unwrap();
        b.add_speaker("LS", Some(3), -110.0, 0.0, None).unwrap();
        b.add_speaker("RS", Some(4), 110.0, 0.0, None).unwrap();
        b.add_speaker("LFE", Some(5), 0.0, -90.0, None).unwrap();
        b
    }

    #[test]
    fn verify_duplicate_speaker_name_rejected() {
        let mut b = symmetric_5_1_builder();
        assert!(b.add_speaker("L", Some(6), 45.0, 0.0, None).is_err());
    }

    #[test]
    fn verify_duplicate_output_index_rejected() {
        let mut b = symmetric_5_1_builder();
        assert!(b.add_speaker("L2", Some(0), 45.0, 0.0, None).is_err());
    }

    #[test]
    fn verify_azimuth_elevation_range_checks() {
        let mut b = ConfigBuilder::new();
        assert!(b.add_speaker("X", Some(0), 400.0, 0.0, None).is_err());
        assert!(b.add_speaker("X", Some(0), 0.0, 95.0, None).is_err());
    }

    #[test]
    fn verify_patch_requires_known_speakers() {
        let mut b = symmetric_5_1_builder();
        assert!(b.add_patch("L", "C", "NOPE").is_err());
    }

    #[test]
    fn verify_patch_build_and_vbap_classification() {
        let mut b = symmetric_5_1_builder();
        b.add_patch("L", "C", "R").unwrap();
        b.set_lfe("LFE").unwrap();
        let config = b.build().unwrap();

        let l = config.speaker_by_name("L").unwrap();
        let lfe = config.speaker_by_name("LFE").unwrap();
        assert!(config.speakers[l].is_vbap);
        assert!(!config.speakers[lfe].is_vbap);
        assert_eq!(config.lfe_speaker, Some(lfe));
    }

    #[test]
    fn verify_downmix_normalization() {
        let mut b = symmetric_5_1_builder();
        b.add_downmix("LS", &[("L", 3.0), ("C", 4.0)]).unwrap();
        let config = b.build().unwrap();
        let dm = &config.downmixes[0];
        let sum_sq: f32 = dm.targets_normalized.iter().map(|&(_, c)| c * c).sum();
        assert!((sum_sq - 1.0).abs() < 1e-5);
    }

    #[test]
    fn verify_downmix_target_must_be_physical() {
        let mut b = symmetric_5_1_builder();
        b.add_speaker("V", None, 45.0, 0.0, None).unwrap();
        assert!(b.add_downmix("L", &[("V", 1.0)]).is_err());
    }

    #[test]
    fn verify_mat3_inverse_identity() {
        let m = Mat3::from_columns([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]);
        let inv = m.inverse(1e-6).unwrap();
        assert_eq!(inv, m);
    }

    #[test]
    fn verify_mat3_singular_rejected() {
        let m = Mat3::from_columns([1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert!(m.inverse(1e-6).is_none());
    }
}
