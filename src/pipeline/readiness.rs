//! Readiness gate for starting generation
//!
//! All requirements must hold; there is no partial credit and no default is
//! substituted for a missing field.

use crate::model::{ConstructionState, ValidationError};

/// Every unmet requirement, in form order.
pub fn missing_requirements(state: &ConstructionState) -> Vec<ValidationError> {
    let mut missing = Vec::new();

    if state.name().trim().is_empty() {
        missing.push(ValidationError::MissingName);
    }
    if state.period().is_none() {
        missing.push(ValidationError::MissingPeriod);
    }
    if state.description().trim().is_empty() {
        missing.push(ValidationError::MissingDescription);
    }
    if state.data_warehouse().is_none() {
        missing.push(ValidationError::MissingDataWarehouse);
    }
    if state.internal_documents().is_empty() {
        missing.push(ValidationError::NoInternalDocuments);
    }
    if state.competitors().is_empty() {
        missing.push(ValidationError::NoCompetitors);
    }
    missing.extend(
        state
            .competitors()
            .iter()
            .filter(|c| !c.has_documents())
            .map(|c| ValidationError::CompetitorWithoutDocuments(c.name.clone())),
    );

    missing
}

/// First unmet requirement, if any
pub fn check_readiness(state: &ConstructionState) -> Result<(), ValidationError> {
    match missing_requirements(state).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Whether generation may start for this state
pub fn is_ready(state: &ConstructionState) -> bool {
    check_readiness(state).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataWarehouse, Period};

    fn ready_state() -> ConstructionState {
        let mut state = ConstructionState::new();
        state.set_name("Q1 2024 Competitive Analysis");
        state.set_description("Peer benchmarking");
        state.set_period(Period::Q1_2024);
        state.set_data_warehouse(DataWarehouse::Primary);
        state.attach_internal_documents(["internal-q1.pdf"]);
        state.add_competitor("Wells Fargo");
        state.attach_competitor_documents(0, ["wfc-10q.pdf"]);
        state
    }

    #[test]
    fn test_complete_state_is_ready() {
        let state = ready_state();
        assert!(is_ready(&state));
        assert!(missing_requirements(&state).is_empty());
    }

    #[test]
    fn test_empty_state_lists_every_requirement() {
        let missing = missing_requirements(&ConstructionState::new());
        assert_eq!(
            missing,
            vec![
                ValidationError::MissingName,
                ValidationError::MissingPeriod,
                ValidationError::MissingDescription,
                ValidationError::MissingDataWarehouse,
                ValidationError::NoInternalDocuments,
                ValidationError::NoCompetitors,
            ]
        );
    }

    #[test]
    fn test_each_missing_scalar_blocks_generation() {
        let mut state = ready_state();
        state.set_name("   ");
        assert_eq!(check_readiness(&state), Err(ValidationError::MissingName));

        let mut state = ready_state();
        state.set_description("");
        assert_eq!(check_readiness(&state), Err(ValidationError::MissingDescription));

        let mut state = ConstructionState::new();
        state.set_name("n");
        state.set_description("d");
        state.set_data_warehouse(DataWarehouse::Risk);
        assert_eq!(check_readiness(&state), Err(ValidationError::MissingPeriod));

        let mut state = ConstructionState::new();
        state.set_name("n");
        state.set_description("d");
        state.set_period(Period::Q4_2024);
        assert_eq!(check_readiness(&state), Err(ValidationError::MissingDataWarehouse));
    }

    #[test]
    fn test_missing_documents_block_generation() {
        let mut state = ready_state();
        state.remove_competitor(0);
        assert_eq!(check_readiness(&state), Err(ValidationError::NoCompetitors));

        let mut state = ConstructionState::new();
        state.set_name("n");
        state.set_description("d");
        state.set_period(Period::Q4_2024);
        state.set_data_warehouse(DataWarehouse::Reporting);
        state.add_competitor("Citi");
        state.attach_competitor_documents(0, ["citi.pdf"]);
        assert_eq!(check_readiness(&state), Err(ValidationError::NoInternalDocuments));
    }

    #[test]
    fn test_competitor_without_documents_blocks_generation() {
        let mut state = ready_state();
        state.add_competitor("PNC Bank");

        assert!(!is_ready(&state));
        assert_eq!(
            check_readiness(&state),
            Err(ValidationError::CompetitorWithoutDocuments("PNC Bank".into()))
        );

        state.attach_competitor_documents(1, ["pnc.pdf"]);
        assert!(is_ready(&state));
    }
}
