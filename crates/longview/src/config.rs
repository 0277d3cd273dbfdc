//! Scenario files: the YAML configuration surface for a dual-income
//! forecast. Every required field is checked upfront so a broken scenario
//! reports all of its problems in one pass.

use serde::Deserialize;

use longview_core::error::ConfigError;
use longview_core::presets::{CoupleEqualizingConfig, CoupleOptimizedConfig};
use longview_core::sim::{DualIncomeParams, PersonParams};

/// Raw per-partner section, straight from YAML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartnerSection {
    pub name: Option<String>,
    pub year_of_birth: Option<i32>,
    pub retirement_age: Option<i32>,
    pub age_at_death: Option<i32>,
    pub initial_salary: Option<f64>,
    #[serde(default)]
    pub initial_deferred: f64,
    #[serde(default)]
    pub initial_exempt: f64,
    pub salary_growth_rate: Option<f64>,
    pub salary_plateau: Option<f64>,
}

/// Initial guesses for the optimizer-tuned preset's free scalars.
#[derive(Debug, Clone, Deserialize)]
pub struct GuessSection {
    #[serde(default = "default_half")]
    pub initial_exempt: f64,
    #[serde(default = "default_half")]
    pub final_exempt: f64,
    #[serde(default = "default_half")]
    pub initial_equalize: f64,
    #[serde(default = "default_half")]
    pub final_equalize: f64,
    #[serde(default = "default_drawdown_correction")]
    pub drawdown_correction: f64,
}

fn default_half() -> f64 {
    0.5
}

fn default_drawdown_correction() -> f64 {
    0.05
}

impl Default for GuessSection {
    fn default() -> Self {
        Self {
            initial_exempt: default_half(),
            final_exempt: default_half(),
            initial_equalize: default_half(),
            final_equalize: default_half(),
            drawdown_correction: default_drawdown_correction(),
        }
    }
}

/// Which preset ruleset to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetChoice {
    /// Simple rules: luxury-over-basic spending, equalizing deferred split.
    Equalizing,
    /// Rising-savings spending and the staged split, tunable by the
    /// optimizer.
    Optimized,
}

/// A scenario file as written by the user.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioFile {
    pub initial_year: Option<i32>,
    #[serde(default)]
    pub target_final_savings: f64,
    pub preset: Option<PresetChoice>,
    pub partner1: Option<PartnerSection>,
    pub partner2: Option<PartnerSection>,
    pub deferred_interest_rate: Option<f64>,
    pub exempt_interest_rate: Option<f64>,
    /// Bracket for the initial-spending solve; defaults to
    /// [0, 3 x combined initial salary].
    pub spending_bounds: Option<(f64, f64)>,
    /// Allowed deviation of terminal savings from the target, in dollars.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    // Equalizing-preset spending model.
    pub base_spending: Option<f64>,
    pub luxury_growth_rate: Option<f64>,
    // Optimized-preset knobs.
    #[serde(default = "default_half")]
    pub savings_weight: f64,
    #[serde(default)]
    pub guesses: GuessSection,
}

fn default_tolerance() -> f64 {
    1.0
}

/// A fully validated scenario, ready to simulate.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub params: DualIncomeParams,
    pub preset: ResolvedPreset,
}

#[derive(Debug, Clone)]
pub enum ResolvedPreset {
    Equalizing(CoupleEqualizingConfig),
    Optimized(CoupleOptimizedConfig),
}

struct FieldCheck<'a> {
    problems: &'a mut Vec<String>,
}

impl FieldCheck<'_> {
    fn require<T: Clone>(&mut self, field: &Option<T>, name: &str, fallback: T) -> T {
        match field {
            Some(value) => value.clone(),
            None => {
                self.problems.push(format!("{name} is missing"));
                fallback
            }
        }
    }
}

fn resolve_partner(
    section: &PartnerSection,
    label: &str,
    problems: &mut Vec<String>,
) -> (PersonParams, f64, f64) {
    let mut check = FieldCheck { problems };
    let params = PersonParams {
        name: section.name.clone().unwrap_or_else(|| label.to_owned()),
        year_of_birth: check.require(&section.year_of_birth, &format!("{label}.year_of_birth"), 0),
        retirement_age: check.require(
            &section.retirement_age,
            &format!("{label}.retirement_age"),
            0,
        ),
        age_at_death: check.require(&section.age_at_death, &format!("{label}.age_at_death"), 1),
        initial_salary: check.require(
            &section.initial_salary,
            &format!("{label}.initial_salary"),
            0.0,
        ),
        initial_deferred: section.initial_deferred,
        initial_exempt: section.initial_exempt,
    };
    let growth = check.require(
        &section.salary_growth_rate,
        &format!("{label}.salary_growth_rate"),
        0.0,
    );
    let plateau = check.require(
        &section.salary_plateau,
        &format!("{label}.salary_plateau"),
        0.0,
    );
    (params, growth, plateau)
}

impl ScenarioFile {
    /// Validates the raw file into a runnable [`Scenario`], enumerating
    /// every missing or invalid field before any simulation work begins.
    pub fn resolve(&self) -> Result<Scenario, ConfigError> {
        let mut problems = Vec::new();

        let partner1_section = self.partner1.clone().unwrap_or_else(|| {
            problems.push("partner1 section is missing".to_owned());
            PartnerSection::default()
        });
        let partner2_section = self.partner2.clone().unwrap_or_else(|| {
            problems.push("partner2 section is missing".to_owned());
            PartnerSection::default()
        });

        let (partner1, growth1, plateau1) =
            resolve_partner(&partner1_section, "partner1", &mut problems);
        let (partner2, growth2, plateau2) =
            resolve_partner(&partner2_section, "partner2", &mut problems);

        let mut check = FieldCheck {
            problems: &mut problems,
        };
        let initial_year = check.require(&self.initial_year, "initial_year", 0);
        let preset = check.require(&self.preset, "preset", PresetChoice::Equalizing);
        let deferred_rate =
            check.require(&self.deferred_interest_rate, "deferred_interest_rate", 0.0);
        let exempt_rate = check.require(&self.exempt_interest_rate, "exempt_interest_rate", 0.0);

        let spending_bounds = self.spending_bounds.unwrap_or((
            0.0,
            3.0 * (partner1.initial_salary + partner2.initial_salary),
        ));

        let params = DualIncomeParams {
            partner1: partner1.clone(),
            partner2: partner2.clone(),
            initial_year,
            target_final_savings: self.target_final_savings,
            spending_bounds,
            tolerance: self.tolerance,
        };

        let preset = match preset {
            PresetChoice::Equalizing => {
                let mut check = FieldCheck {
                    problems: &mut problems,
                };
                let base_spending = check.require(&self.base_spending, "base_spending", 0.0);
                let luxury_growth_rate =
                    check.require(&self.luxury_growth_rate, "luxury_growth_rate", 0.0);
                ResolvedPreset::Equalizing(CoupleEqualizingConfig {
                    partner1_salary_growth_rate: growth1,
                    partner1_salary_plateau: plateau1,
                    partner2_salary_growth_rate: growth2,
                    partner2_salary_plateau: plateau2,
                    base_spending,
                    luxury_growth_rate,
                    deferred_interest_rate: deferred_rate,
                    exempt_interest_rate: exempt_rate,
                })
            }
            PresetChoice::Optimized => ResolvedPreset::Optimized(CoupleOptimizedConfig {
                partner1_salary_growth_rate: growth1,
                partner1_salary_plateau: plateau1,
                partner2_salary_growth_rate: growth2,
                partner2_salary_plateau: plateau2,
                initial_year,
                savings_weight: self.savings_weight,
                initial_exempt_guess: self.guesses.initial_exempt,
                final_exempt_guess: self.guesses.final_exempt,
                initial_equalize_guess: self.guesses.initial_equalize,
                final_equalize_guess: self.guesses.final_equalize,
                drawdown_correction_guess: self.guesses.drawdown_correction,
                partner1_year_of_retirement: partner1.year_of_retirement(),
                partner2_year_of_retirement: partner2.year_of_retirement(),
                final_year: partner1.year_of_death().max(partner2.year_of_death()),
                deferred_interest_rate: deferred_rate,
                exempt_interest_rate: exempt_rate,
            }),
        };

        if !problems.is_empty() {
            return Err(ConfigError::new(problems));
        }
        // Domain validation on top of presence checks.
        params.validate()?;

        Ok(Scenario { params, preset })
    }
}

/// Parses and validates a scenario from YAML text.
pub fn parse_scenario(text: &str) -> Result<Scenario, ConfigError> {
    let file: ScenarioFile = serde_saphyr::from_str(text)
        .map_err(|e| ConfigError::new(vec![format!("scenario is not valid YAML: {e}")]))?;
    file.resolve()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
initial_year: 2025
target_final_savings: 10000
preset: equalizing
deferred_interest_rate: 0.08
exempt_interest_rate: 0.08
base_spending: 60000
luxury_growth_rate: 0.05
partner1:
  name: Alex
  year_of_birth: 1990
  retirement_age: 60
  age_at_death: 80
  initial_salary: 40000
  initial_deferred: 5000
  initial_exempt: 600
  salary_growth_rate: 0.06
  salary_plateau: 80000
partner2:
  name: Sam
  year_of_birth: 1989
  retirement_age: 64
  age_at_death: 75
  initial_salary: 60000
  initial_deferred: 2000
  initial_exempt: 800
  salary_growth_rate: 0.04
  salary_plateau: 75000
"#;

    #[test]
    fn parses_a_complete_scenario() {
        let scenario = parse_scenario(SAMPLE).unwrap();
        assert_eq!(scenario.params.partner1.name, "Alex");
        assert_eq!(scenario.params.partner2.year_of_retirement(), 2053);
        assert_eq!(scenario.params.final_year(), 2070);
        // Default bracket: three times combined salary.
        assert_eq!(scenario.params.spending_bounds, (0.0, 300_000.0));
        assert!(matches!(scenario.preset, ResolvedPreset::Equalizing(_)));
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let scenario = parse_scenario("preset: equalizing\n");
        let err = scenario.unwrap_err();
        let rendered = err.problems.join("\n");
        assert!(rendered.contains("partner1 section is missing"));
        assert!(rendered.contains("partner2 section is missing"));
        assert!(rendered.contains("initial_year is missing"));
        assert!(rendered.contains("deferred_interest_rate is missing"));
        assert!(rendered.contains("base_spending is missing"));
    }

    #[test]
    fn optimized_preset_carries_the_guesses() {
        let text = SAMPLE.replace("preset: equalizing", "preset: optimized");
        let scenario = parse_scenario(&text).unwrap();
        match scenario.preset {
            ResolvedPreset::Optimized(config) => {
                assert_eq!(config.initial_exempt_guess, 0.5);
                assert_eq!(config.drawdown_correction_guess, 0.05);
                assert_eq!(config.partner1_year_of_retirement, 2050);
                assert_eq!(config.final_year, 2070);
            }
            ResolvedPreset::Equalizing(_) => panic!("expected the optimized preset"),
        }
    }
}
