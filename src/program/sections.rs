//! The five program sections, each a pure function of a [`ModelSpec`].
//!
//! Per-kind fragments are `&'static str`; the section functions only choose
//! and assemble them, so a section depends on nothing but the spec.
use super::generator::ModelSpec;
use super::kinds::{CarryoverKind, SaturationKind};
use super::priors::ModelParameter;

const LOGISTIC_FUNCTION: &str = "\
real logistic_saturation(real x, real ec, real slope) {
  return 1 / (1 + (x / ec) ^ (-slope));
}";

const REACH_FUNCTION: &str = "\
real reach_saturation(real x, real half_saturation) {
  return (1 - exp(-half_saturation * x)) / (1 + exp(-half_saturation * x));
}";

const GEOMETRIC_DECAY_FUNCTION: &str = "\
real geometric_decay(row_vector lags, int max_lag, real retain_rate) {
  row_vector[max_lag] weights;
  for (lag in 1:max_lag) {
    weights[lag] = pow(retain_rate, lag - 1);
  }
  return dot_product(lags, weights) / sum(weights);
}";

const PEAKED_DECAY_FUNCTION: &str = "\
real peaked_decay(row_vector lags, int max_lag, real retain_rate, real delay) {
  row_vector[max_lag] weights;
  for (lag in 1:max_lag) {
    weights[lag] = pow(retain_rate, (lag - 1 - delay) ^ 2);
  }
  return dot_product(lags, weights) / sum(weights);
}";

/// `functions { ... }`: the saturation kernel, then the carryover kernel.
pub fn functions_section(spec: &ModelSpec) -> String {
    let saturation = match spec.saturation {
        SaturationKind::Logistic => LOGISTIC_FUNCTION,
        SaturationKind::Reach => REACH_FUNCTION,
    };
    let carryover = match spec.carryover {
        CarryoverKind::GeometricDecay => GEOMETRIC_DECAY_FUNCTION,
        CarryoverKind::PeakedDecay => PEAKED_DECAY_FUNCTION,
    };
    block("functions", &[saturation, carryover])
}

/// `data { ... }`: the names must match the keys of `SamplerInput`.
pub fn data_section(spec: &ModelSpec) -> String {
    let mut lines = vec![
        "int<lower=1> N;",
        "array[N] real<lower=0> Y;",
        "int<lower=1> max_lag;",
        "int<lower=1> num_media;",
        "array[N, num_media] row_vector[max_lag] X_media;",
    ];
    if spec.has_controls {
        lines.push("int<lower=1> num_ctrl;");
        lines.push("array[N] row_vector[num_ctrl] X_ctrl;");
    }
    block("data", &lines)
}

/// `parameters { ... }` in [`ModelSpec::parameters`] order.
pub fn parameters_section(spec: &ModelSpec) -> String {
    let lines: Vec<&str> = spec.parameters().into_iter().map(declaration).collect();
    block("parameters", &lines)
}

/// `transformed parameters { ... }`: the predicted mean `mu` per observation.
pub fn transformed_parameters_section(spec: &ModelSpec) -> String {
    let carryover_call = match spec.carryover {
        CarryoverKind::GeometricDecay => {
            "geometric_decay(X_media[nn, media], max_lag, retain_rate[media])"
        }
        CarryoverKind::PeakedDecay => {
            "peaked_decay(X_media[nn, media], max_lag, retain_rate[media], delay[media])"
        }
    };
    let saturation_call = match spec.saturation {
        SaturationKind::Logistic => "logistic_saturation(cum_effect, ec[media], slope[media])",
        SaturationKind::Reach => "reach_saturation(cum_effect, half_saturation[media])",
    };
    let controls = if spec.has_controls { " + dot_product(X_ctrl[nn], gamma_ctrl)" } else { "" };

    let body = format!(
        "array[N] real mu;
array[N] row_vector[num_media] cum_effects;
for (nn in 1:N) {{
  for (media in 1:num_media) {{
    real cum_effect = {carryover_call};
    cum_effects[nn, media] = {saturation_call};
  }}
  mu[nn] = tau + dot_product(cum_effects[nn], beta_medias){controls};
}}"
    );
    block("transformed parameters", &[body.as_str()])
}

/// `model { ... }`: one prior per parameter, then the likelihood.
pub fn model_section(spec: &ModelSpec) -> String {
    let mut lines: Vec<String> = spec
        .prior_order()
        .into_iter()
        .map(|p| format!("{} ~ {};", p.name(), p.prior().to_stan()))
        .collect();
    lines.push("Y ~ normal(mu, sqrt(noise_var));".to_string());
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    block("model", &refs)
}

fn declaration(parameter: ModelParameter) -> &'static str {
    match parameter {
        ModelParameter::NoiseVar => "real<lower=0> noise_var;",
        ModelParameter::Tau => "real<lower=0> tau;",
        ModelParameter::BetaMedias => "vector<lower=0>[num_media] beta_medias;",
        ModelParameter::RetainRate => "vector<lower=0, upper=1>[num_media] retain_rate;",
        ModelParameter::Delay => "vector<lower=0, upper=max_lag - 1>[num_media] delay;",
        ModelParameter::GammaCtrl => "vector[num_ctrl] gamma_ctrl;",
        ModelParameter::Ec => "vector<lower=0, upper=1>[num_media] ec;",
        ModelParameter::Slope => "vector<lower=0>[num_media] slope;",
        ModelParameter::HalfSaturation => "vector<lower=0>[num_media] half_saturation;",
    }
}

/// `header {` + two-space indented items + `}`.
fn block(header: &str, items: &[&str]) -> String {
    let mut out = format!("{header} {{\n");
    for item in items {
        for line in item.lines() {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Control declarations appear only when controls are requested.
    //
    // Given
    // -----
    // - Geometric/logistic specs with and without controls.
    //
    // Expect
    // ------
    // - `X_ctrl` and `gamma_ctrl` appear in data, parameters, transformed
    //   parameters, and model only for the controlled spec.
    fn control_fragments_follow_the_flag() {
        // Arrange
        let with = ModelSpec::new(CarryoverKind::GeometricDecay, SaturationKind::Logistic, true);
        let without = ModelSpec::new(CarryoverKind::GeometricDecay, SaturationKind::Logistic, false);

        // Act / Assert
        assert!(data_section(&with).contains("X_ctrl"));
        assert!(!data_section(&without).contains("X_ctrl"));
        assert!(parameters_section(&with).contains("gamma_ctrl"));
        assert!(!parameters_section(&without).contains("gamma_ctrl"));
        assert!(transformed_parameters_section(&with).contains("dot_product(X_ctrl[nn], gamma_ctrl)"));
        assert!(!transformed_parameters_section(&without).contains("X_ctrl"));
        assert!(model_section(&with).contains("gamma_ctrl ~ normal(0, 1);"));
        assert!(!model_section(&without).contains("gamma_ctrl"));
    }

    #[test]
    // Purpose
    // -------
    // The function section defines exactly the two selected kernels,
    // saturation first.
    //
    // Given
    // -----
    // - A peaked-decay / reach spec.
    //
    // Expect
    // ------
    // - `reach_saturation` precedes `peaked_decay`; the other kernels are absent.
    fn functions_section_defines_selected_kernels() {
        // Arrange
        let spec = ModelSpec::new(CarryoverKind::PeakedDecay, SaturationKind::Reach, false);

        // Act
        let text = functions_section(&spec);

        // Assert
        let reach = text.find("real reach_saturation(").unwrap();
        let peaked = text.find("real peaked_decay(").unwrap();
        assert!(reach < peaked);
        assert!(!text.contains("logistic_saturation"));
        assert!(!text.contains("geometric_decay"));
        assert!(text.starts_with("functions {\n") && text.ends_with('}'));
    }

    #[test]
    // Purpose
    // -------
    // Every declared parameter receives exactly one prior statement.
    //
    // Given
    // -----
    // - All eight specs.
    //
    // Expect
    // ------
    // - For each declared parameter `p`, the model section contains
    //   `"{p} ~ "` exactly once.
    fn model_section_covers_every_parameter() {
        for spec in ModelSpec::all() {
            let model = model_section(&spec);
            for p in spec.parameters() {
                let needle = format!("\n  {} ~ ", p.name());
                assert_eq!(model.matches(&needle).count(), 1, "{} in {:?}", p.name(), spec);
            }
        }
    }
}
