//! Formatted terminal output.
//!
//! We keep formatting code in one place so the numerical modules stay free of
//! presentation concerns.

use crate::app::pipeline::Comparison;
use crate::cosmology::CosmologyModel;
use crate::domain::{CoordSource, PowerOverrides};
use crate::mock::MockRealization;
use crate::survey::Survey;

/// Derived quantities of a cosmology, one per line.
pub fn format_cosmology(cosmo: &CosmologyModel) -> String {
    let p = cosmo.params();
    let mut out = String::new();
    out.push_str("=== sigmax - cosmology ===\n");
    out.push_str(&format!(
        "H0={:.2} ombh2={:.5} omch2={:.5} mnu={:.3} As={:.3e} ns={:.4}\n",
        p.h0, p.ombh2, p.omch2, p.mnu, p.a_s, p.n_s
    ));
    out.push_str(&format!("z = {}\n", cosmo.z()));
    out.push_str(&format!("b = {}\n", cosmo.bias()));
    out.push_str(&format!("Omega_m = {:.6}\n", cosmo.omega_m()));
    out.push_str(&format!("f = {:.6}\n", cosmo.growth_rate()));
    out.push_str(&format!("sig8 = {:.6}\n", cosmo.sigma8()));
    out.push_str(&format!("sig12 = {:.6}\n", cosmo.sigma12()));
    out.push_str(&format!("f sig8 = {:.6}\n", cosmo.fsigma8()));
    out.push_str(&format!("b sig8 = {:.6}\n", cosmo.bsigma8()));
    out.push_str(&format!("DA = {:.3} Mpc\n", cosmo.angular_diameter_distance()));
    out.push_str(&format!("DH = {:.3} Mpc\n", cosmo.hubble_distance()));
    out
}

/// Survey geometry followed by a per-bin table.
pub fn format_survey(survey: &Survey) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Survey: z={} | Nk={} ({} bins) | dk={} 1/Mpc\n",
        survey.z,
        survey.nk,
        survey.n_bins(),
        survey.dk
    ));
    out.push_str(&format!(
        "dqt={:.4} dqp={:.4} | V={:.3e} Mpc^3 (obs {:.4e}) | N_gal={:.3e} (n_obs {:.4e})\n",
        survey.dqt, survey.dqp, survey.volume_mpc3, survey.volume_obs, survey.n_gal, survey.ng_obs
    ));
    out.push_str("Note: sigP/P uses the literal shot-noise term (1 + nP/nP) = 2.\n\n");

    push_row(&mut out, &["i", "it", "ip", "qt", "qp", "nP", "sigP/P"]);
    push_rule(&mut out, 7);
    for bin in survey.bins() {
        push_row(
            &mut out,
            &[
                bin.index.to_string(),
                bin.it.to_string(),
                bin.ip.to_string(),
                format!("{:.3}", bin.qt),
                format!("{:.3}", bin.qp),
                format!("{:.4e}", bin.np),
                format!("{:.5}", bin.sigp_p),
            ],
        );
    }
    out
}

pub fn format_mock(survey: &Survey, mock: &MockRealization, seed: u64) -> String {
    let mut out = String::new();
    out.push_str(&format!("Mock realization (seed={seed}, {} bins)\n", mock.len()));
    if survey.n_bins() != mock.len() {
        out.push_str(&format!(
            "Warning: survey has {} bins; showing the first {}.\n",
            survey.n_bins(),
            survey.n_bins().min(mock.len())
        ));
    }
    push_row(&mut out, &["i", "qt", "qp", "P_model", "P_mock", "sigma", "pull"]);
    push_rule(&mut out, 7);
    let columns = survey
        .qt
        .iter()
        .zip(&survey.qp)
        .zip(mock.expected.iter().zip(&mock.power).zip(&mock.error))
        .zip(mock.pulls());
    for (i, (((qt, qp), ((expected, power), error)), pull)) in columns.enumerate() {
        push_row(
            &mut out,
            &[
                i.to_string(),
                format!("{qt:.3}"),
                format!("{qp:.3}"),
                format!("{expected:.5e}"),
                format!("{power:.5e}"),
                format!("{error:.5e}"),
                format!("{pull:+.3}"),
            ],
        );
    }
    out
}

pub fn format_comparison(cmp: &Comparison) -> String {
    let mut out = String::new();
    let t = cmp.template.params();
    out.push_str("=== sigmax - template vs truth ===\n");
    out.push_str(&format!(
        "Template: H0={:.2} ombh2={:.5} omch2={:.5} b={} | coordinates from {}\n",
        t.h0,
        t.ombh2,
        t.omch2,
        cmp.template.bias(),
        match cmp.coord {
            CoordSource::True => "truth",
            CoordSource::Template => "template",
        }
    ));
    out.push_str(&format!("Overrides: {}\n", fmt_overrides(&cmp.overrides)));
    out.push_str(&format!(
        "fsig8 true={:.5} template={:.5} | bsig8 true={:.5} template={:.5}\n\n",
        cmp.truth.fsigma8(),
        cmp.template.fsigma8(),
        cmp.truth.bsigma8(),
        cmp.template.bsigma8()
    ));

    push_row(&mut out, &["i", "qt", "qp", "P_true", "P_model", "ratio", "dev/sigma"]);
    push_rule(&mut out, 7);
    for row in &cmp.rows {
        push_row(
            &mut out,
            &[
                row.index.to_string(),
                format!("{:.3}", row.qt),
                format!("{:.3}", row.qp),
                format!("{:.5e}", row.p_true),
                format!("{:.5e}", row.p_model),
                format!("{:.5}", row.ratio),
                format!("{:+.3}", row.deviation),
            ],
        );
    }
    out.push_str(&format!("\nmax |dev/sigma| = {:.3}\n", cmp.max_abs_deviation()));
    out
}

fn fmt_overrides(o: &PowerOverrides) -> String {
    if o.is_empty() {
        return "none".to_string();
    }
    let mut parts = Vec::new();
    let named = [("fsig8", o.fsig8), ("bsig8", o.bsig8), ("at", o.at), ("ap", o.ap)];
    for (name, value) in named {
        if let Some(v) = value {
            parts.push(format!("{name}={v}"));
        }
    }
    parts.join(" ")
}

const COL: usize = 12;

fn push_row<S: AsRef<str>>(out: &mut String, cells: &[S]) {
    let line: Vec<String> = cells.iter().map(|c| format!("{:>COL$}", c.as_ref())).collect();
    out.push_str(line.join(" ").trim_end());
    out.push('\n');
}

fn push_rule(out: &mut String, columns: usize) {
    let line = vec!["-".repeat(COL); columns];
    out.push_str(&line.join(" "));
    out.push('\n');
}
