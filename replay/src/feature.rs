use std::collections::HashSet;

///
/// Identifier of a feature being drawn
///
/// The pipeline never looks inside a feature: it records which feature produced which
/// instructions so that hit detection can report it and so that whole features can be
/// skipped at replay time (eg, while one is being interactively edited on a vector
/// overlay).
///
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

///
/// The set of features to leave out of a replay pass
///
pub type FeatureSkipSet = HashSet<FeatureId>;
