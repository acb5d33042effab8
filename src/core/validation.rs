use crate::core::extract::ServiceCatalog;
use crate::core::readiness::MissingField;
use crate::models::{format_money, PreferenceRecord};
use thiserror::Error;

/// Business rule broken by an otherwise complete record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationViolation {
    #[error("your budget needs to be more than $0")]
    NonPositiveBudget,

    #[error("a budget of ${amount} is above our ${ceiling} limit")]
    BudgetAboveCeiling { amount: String, ceiling: String },

    #[error("the minimum budget can't be negative")]
    NegativeMinimum,

    #[error("the minimum budget (${min}) is higher than the maximum (${max})")]
    InvertedBudget { min: String, max: String },
}

impl ValidationViolation {
    /// Field the user is asked about again
    pub fn field(&self) -> MissingField {
        MissingField::Budget
    }

    /// `I need a bit more information: ...`
    pub fn clarification(&self) -> String {
        format!("I need a bit more information: {}. What budget works for you?", self)
    }
}

/// Thresholds for the post-readiness sanity checks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationRules {
    pub budget_ceiling: f64,
    pub low_budget_warning: f64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            budget_ceiling: 1000.0,
            low_budget_warning: 10.0,
        }
    }
}

impl ValidationRules {
    /// Check a ready record. Returns soft warnings, or the first hard violation.
    ///
    /// Urgency needs no check here: `TimeUrgency` cannot hold a value outside the known set.
    pub fn check(
        &self,
        record: &PreferenceRecord,
        catalog: &ServiceCatalog,
    ) -> Result<Vec<String>, ValidationViolation> {
        let mut warnings = Vec::new();

        if let Some(max) = record.budget_max {
            if max <= 0.0 {
                return Err(ValidationViolation::NonPositiveBudget);
            }
            if max > self.budget_ceiling {
                return Err(ValidationViolation::BudgetAboveCeiling {
                    amount: format_money(max),
                    ceiling: format_money(self.budget_ceiling),
                });
            }
            if max < self.low_budget_warning {
                warnings.push(format!(
                    "Budget of ${} is quite low; most services cost more",
                    format_money(max)
                ));
            }
        }

        if let Some(min) = record.budget_min {
            if min < 0.0 {
                return Err(ValidationViolation::NegativeMinimum);
            }
            if let Some(max) = record.budget_max {
                if min > max {
                    return Err(ValidationViolation::InvertedBudget {
                        min: format_money(min),
                        max: format_money(max),
                    });
                }
            }
        }

        if let Some(service) = &record.service_type {
            if !catalog.is_known(service) {
                warnings.push(format!("Unusual service type: {}", service));
            }
        }

        Ok(warnings)
    }
}
