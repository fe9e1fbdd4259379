//! Dispatch-readiness rules for the appliance.
//!
//! The crew currently available must satisfy all of:
//! 1. at least 4 people (`total_crew_ok`)
//! 2. someone who can take charge, tagged TTR or IC (`ttr_present`)
//! 3. a driver, tagged LGV or ERD (`lgv_present`)
//! 4. at least 2 BA wearers besides those counted for TTR (`ba_non_ttr_ok`)
//! 5. a senior (FFC or above) BA wearer (`ffc_with_ba`)

use serde::Serialize;

use crate::aggregator::AvailableFor;
use crate::config::ReadinessConfig;
use crate::models::Personnel;
use crate::skills::SkillTag;
use crate::{log_changes, log_checks};

const TTR_TAGS: [SkillTag; 2] = [SkillTag::Ttr, SkillTag::Ic];
const LGV_TAGS: [SkillTag; 2] = [SkillTag::Lgv, SkillTag::Erd];

/// Per-skill head counts over the available crew.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct SkillCounts {
    pub ttr: usize,
    pub lgv: usize,
    pub ba: usize,
}

/// Outcome of each readiness rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RuleOutcomes {
    pub total_crew_ok: bool,
    pub ttr_present: bool,
    pub lgv_present: bool,
    pub ba_non_ttr_ok: bool,
    pub ffc_with_ba: bool,
}

impl RuleOutcomes {
    pub fn all(&self) -> bool {
        self.total_crew_ok
            && self.ttr_present
            && self.lgv_present
            && self.ba_non_ttr_ok
            && self.ffc_with_ba
    }
}

/// Readiness verdict for the appliance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReadinessResult {
    pub rules_pass: bool,
    pub rules: RuleOutcomes,
    pub skill_counts: SkillCounts,
    pub ba_non_ttr: usize,
}

fn counts_as_ttr(person: &Personnel, config: &ReadinessConfig) -> bool {
    person.skills.contains_any(&TTR_TAGS)
        || (config.senior_counts_as_ttr && config.is_senior(&person.role))
}

/// Evaluate the readiness rules over the currently available crew.
pub fn evaluate(available: &[Personnel], config: &ReadinessConfig, verbosity: u8) -> ReadinessResult {
    if available.is_empty() {
        log_changes!(verbosity, "no crew available, appliance not ready");
        return ReadinessResult::default();
    }

    let mut counts = SkillCounts::default();
    let mut ba_non_ttr = 0;
    let mut ffc_with_ba = false;

    for person in available {
        if !person.unrecognised_skills.is_empty() {
            log_checks!(
                verbosity,
                "{}: ignoring unrecognised skill(s) {:?}",
                person.name,
                person.unrecognised_skills
            );
        }

        let is_ttr = counts_as_ttr(person, config);
        let is_ba = person.skills.contains(SkillTag::Ba);

        if is_ttr {
            counts.ttr += 1;
        }
        if person.skills.contains_any(&LGV_TAGS) {
            counts.lgv += 1;
        }
        if is_ba {
            counts.ba += 1;
            if !is_ttr {
                ba_non_ttr += 1;
            }
            if config.is_senior(&person.role) {
                ffc_with_ba = true;
            }
        }
    }

    let rules = RuleOutcomes {
        total_crew_ok: available.len() >= config.min_crew,
        ttr_present: counts.ttr > 0,
        lgv_present: counts.lgv > 0,
        ba_non_ttr_ok: ba_non_ttr >= config.min_ba_non_ttr,
        ffc_with_ba,
    };
    let result = ReadinessResult {
        rules_pass: rules.all(),
        rules,
        skill_counts: counts,
        ba_non_ttr,
    };

    log_changes!(
        verbosity,
        "readiness over {} crew: pass={} {:?} ba_non_ttr={}",
        available.len(),
        result.rules_pass,
        result.skill_counts,
        result.ba_non_ttr
    );
    result
}

/// What the serving layer reports for the appliance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DispatchVerdict {
    pub available: bool,
    pub duration: Option<AvailableFor>,
}

/// Combine the appliance's own availability with the crew verdict.
///
/// No duration is reported while the crew rules fail, even if the
/// appliance itself is free.
pub fn dispatch_verdict(
    physically_available: bool,
    remaining: Option<AvailableFor>,
    readiness: &ReadinessResult,
) -> DispatchVerdict {
    DispatchVerdict {
        available: physically_available && readiness.rules_pass,
        duration: remaining.filter(|_| readiness.rules_pass),
    }
}
