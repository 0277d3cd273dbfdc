//! Plain-text reporting over a completed couple run: extracted time series
//! and formatted tables.

use longview_core::sim::{CoupleRunHistory, DualIncomeParams};

/// Format a currency value without cents, with thousands separators.
pub fn format_currency(value: f64) -> String {
    let dollars = value.abs().round() as i64;
    let dollars_str = dollars.to_string();
    let mut result = String::new();
    for (i, c) in dollars_str.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    let formatted: String = result.chars().rev().collect();

    if value >= 0.0 {
        format!("${formatted}")
    } else {
        format!("-${formatted}")
    }
}

/// Format a rate as a percentage.
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Read-only series extraction over a completed run.
pub struct Presenter<'a> {
    run: &'a CoupleRunHistory,
    params: &'a DualIncomeParams,
}

impl<'a> Presenter<'a> {
    pub fn new(run: &'a CoupleRunHistory, params: &'a DualIncomeParams) -> Self {
        Self { run, params }
    }

    pub fn years(&self) -> Vec<i32> {
        self.run.funds.iter().map(|f| f.year()).collect()
    }

    pub fn partner1_salaries(&self) -> Vec<f64> {
        self.run
            .deltas
            .iter()
            .map(|d| d.partner1().gross_salary())
            .collect()
    }

    pub fn partner2_salaries(&self) -> Vec<f64> {
        self.run
            .deltas
            .iter()
            .map(|d| d.partner2().gross_salary())
            .collect()
    }

    pub fn household_spending(&self) -> Vec<f64> {
        self.run
            .deltas
            .iter()
            .map(|d| d.household_spending())
            .collect()
    }

    pub fn total_savings(&self) -> Vec<f64> {
        self.run.funds.iter().map(|f| f.total()).collect()
    }

    /// Household spending in the first simulated year.
    pub fn first_year_spending(&self) -> f64 {
        self.run
            .deltas
            .get(1)
            .map_or(0.0, |d| d.household_spending())
    }

    /// Household spending in the final year, i.e. the retirement income.
    pub fn retirement_spending(&self) -> f64 {
        self.run
            .deltas
            .last()
            .map_or(0.0, |d| d.household_spending())
    }

    pub fn average_yearly_spending(&self) -> f64 {
        let spendings: Vec<f64> = self.household_spending().into_iter().skip(1).collect();
        if spendings.is_empty() {
            return 0.0;
        }
        spendings.iter().sum::<f64>() / spendings.len() as f64
    }

    /// One-paragraph narrative of the solved plan.
    pub fn summary(&self) -> String {
        let p1 = &self.params.partner1;
        let p2 = &self.params.partner2;
        format!(
            "{} works until {}. {} works until {}. In the first year they spend {}. \
             In retirement they have an income of {} a year. Their lifetime average \
             yearly spending is {}.",
            p1.name,
            p1.year_of_retirement(),
            p2.name,
            p2.year_of_retirement(),
            format_currency(self.first_year_spending()),
            format_currency(self.retirement_spending()),
            format_currency(self.average_yearly_spending()),
        )
    }

    /// A year-by-year table of salaries, monthly spending and monthly
    /// saving for the first `years` simulated years.
    pub fn savings_table(&self, years: usize) -> String {
        let p1 = &self.params.partner1;
        let p2 = &self.params.partner2;
        let mut out = format!(
            "{:<6} {:>14} {:>14} {:>18} {:>16}\n",
            "Year",
            format!("{} salary", p1.name),
            format!("{} salary", p2.name),
            "Monthly spending",
            "Monthly saving"
        );
        for deltas in self.run.deltas.iter().skip(1).take(years) {
            let saved = deltas.partner1().deferred_flow()
                + deltas.partner1().exempt_flow()
                + deltas.partner2().deferred_flow()
                + deltas.partner2().exempt_flow();
            out.push_str(&format!(
                "{:<6} {:>14} {:>14} {:>18} {:>16}\n",
                deltas.year(),
                format_currency(deltas.partner1().gross_salary()),
                format_currency(deltas.partner2().gross_salary()),
                format_currency(deltas.household_spending() / 12.0),
                format_currency(saved / 12.0),
            ));
        }
        out
    }

    /// Savings and salaries sampled every `stride` years across the whole
    /// run, ending on the final year.
    pub fn trajectory_table(&self, stride: usize) -> String {
        let years = self.years();
        let salaries1 = self.partner1_salaries();
        let salaries2 = self.partner2_salaries();
        let totals = self.total_savings();
        let stride = stride.max(1);

        let mut out = format!(
            "{:<6} {:>14} {:>14} {:>16}\n",
            "Year", "Salary (1)", "Salary (2)", "Total savings"
        );
        for i in (0..years.len()).step_by(stride).chain(
            // Always include the final year.
            (years.len() > 1 && (years.len() - 1) % stride != 0)
                .then_some(years.len() - 1),
        ) {
            out.push_str(&format!(
                "{:<6} {:>14} {:>14} {:>16}\n",
                years[i],
                format_currency(salaries1[i]),
                format_currency(salaries2[i]),
                format_currency(totals[i]),
            ));
        }
        out
    }

    /// A year-by-year breakdown of monthly contributions per partner and
    /// account for the first `years` simulated years.
    pub fn contributions_table(&self, years: usize) -> String {
        let p1 = &self.params.partner1;
        let p2 = &self.params.partner2;
        let mut out = format!(
            "{:<6} {:>16} {:>16} {:>16} {:>16}\n",
            "Year",
            format!("{} deferred", p1.name),
            format!("{} tax-free", p1.name),
            format!("{} deferred", p2.name),
            format!("{} tax-free", p2.name),
        );
        for deltas in self.run.deltas.iter().skip(1).take(years) {
            out.push_str(&format!(
                "{:<6} {:>16} {:>16} {:>16} {:>16}\n",
                deltas.year(),
                format_currency(deltas.partner1().deferred_flow() / 12.0),
                format_currency(deltas.partner1().exempt_flow() / 12.0),
                format_currency(deltas.partner2().deferred_flow() / 12.0),
                format_currency(deltas.partner2().exempt_flow() / 12.0),
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(950.4), "$950");
        assert_eq!(format_currency(1_234_567.0), "$1,234,567");
        assert_eq!(format_currency(-44_000.0), "-$44,000");
    }

    #[test]
    fn percentage_formatting() {
        assert_eq!(format_percentage(0.05), "5.0%");
        assert_eq!(format_percentage(0.061), "6.1%");
    }
}
