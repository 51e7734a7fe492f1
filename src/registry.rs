//! The fixed set of response schemas, one per clinical feature.
//!
//! Registration happens once at process start; afterwards the registry is
//! read-only, so any number of concurrent requests can consult it without
//! coordination. No schema is ever mutated or removed at runtime.

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use crate::agents;
use crate::schema::SchemaSpec;

/// Every clinical feature the gateway exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Diagnosis,
    Summarization,
    Icd10,
    DrugInteraction,
    GuestBooking,
    HealthAnalysis,
    VitalsAnomaly,
    Adherence,
    LabInterpretation,
    Readmission,
    Prescription,
    NoShow,
    Imaging,
}

impl Feature {
    pub const ALL: [Feature; 13] = [
        Feature::Diagnosis,
        Feature::Summarization,
        Feature::Icd10,
        Feature::DrugInteraction,
        Feature::GuestBooking,
        Feature::HealthAnalysis,
        Feature::VitalsAnomaly,
        Feature::Adherence,
        Feature::LabInterpretation,
        Feature::Readmission,
        Feature::Prescription,
        Feature::NoShow,
        Feature::Imaging,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::Diagnosis => "diagnosis",
            Feature::Summarization => "summarization",
            Feature::Icd10 => "icd10",
            Feature::DrugInteraction => "drug-interaction",
            Feature::GuestBooking => "guest-booking",
            Feature::HealthAnalysis => "health-analysis",
            Feature::VitalsAnomaly => "vitals-anomaly",
            Feature::Adherence => "adherence",
            Feature::LabInterpretation => "lab-interpretation",
            Feature::Readmission => "readmission",
            Feature::Prescription => "prescription",
            Feature::NoShow => "no-show",
            Feature::Imaging => "imaging",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The live collection of schemas, keyed by feature.
#[derive(Debug, Clone)]
pub struct Registry {
    specs: Arc<DashMap<Feature, Arc<SchemaSpec>>>,
}

impl Registry {
    /// Registers every feature's schema. Called once when the state is built.
    pub fn bootstrap() -> Self {
        let specs = Arc::new(DashMap::new());
        for feature in Feature::ALL {
            specs.insert(feature, Arc::new(spec_for(feature)));
        }
        Registry { specs }
    }

    pub fn spec(&self, feature: Feature) -> Option<Arc<SchemaSpec>> {
        self.specs.get(&feature).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

fn spec_for(feature: Feature) -> SchemaSpec {
    match feature {
        Feature::Diagnosis => agents::diagnosis::spec(),
        Feature::Summarization => agents::summarization::spec(),
        Feature::Icd10 => agents::icd10::spec(),
        Feature::DrugInteraction => agents::drug_interaction::spec(),
        Feature::GuestBooking => agents::guest_booking::spec(),
        Feature::HealthAnalysis => agents::health_analysis::spec(),
        Feature::VitalsAnomaly => agents::vitals_anomaly::spec(),
        Feature::Adherence => agents::adherence::spec(),
        Feature::LabInterpretation => agents::lab_interpretation::spec(),
        Feature::Readmission => agents::readmission::spec(),
        Feature::Prescription => agents::prescription::spec(),
        Feature::NoShow => agents::no_show::spec(),
        Feature::Imaging => agents::imaging::spec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Payload;

    #[test]
    fn bootstrap_registers_every_feature() {
        let registry = Registry::bootstrap();
        assert_eq!(registry.len(), Feature::ALL.len());
        for feature in Feature::ALL {
            assert!(registry.spec(feature).is_some(), "missing spec for {feature}");
        }
    }

    #[test]
    fn spec_names_match_their_feature() {
        let registry = Registry::bootstrap();
        for feature in Feature::ALL {
            let spec = registry.spec(feature).unwrap();
            assert_eq!(spec.feature, feature.as_str());
        }
    }

    #[test]
    fn list_shaped_features_declare_many() {
        let registry = Registry::bootstrap();
        for feature in [Feature::Diagnosis, Feature::Icd10, Feature::DrugInteraction] {
            assert_eq!(registry.spec(feature).unwrap().payload, Payload::Many);
        }
        assert_eq!(
            registry.spec(Feature::GuestBooking).unwrap().payload,
            Payload::Single
        );
    }

    #[test]
    fn every_spec_produces_format_instructions() {
        let registry = Registry::bootstrap();
        for feature in Feature::ALL {
            let text = registry.spec(feature).unwrap().format_instructions();
            assert!(
                text.contains("Return ONLY valid JSON"),
                "instructions for {feature} lost the JSON-only tail"
            );
        }
    }
}
