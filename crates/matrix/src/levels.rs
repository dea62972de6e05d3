use serde::{Deserialize, Serialize};

/// A predictor level a node can be split on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelOption {
    /// Index into the threshold pairs of a row
    pub index: usize,
    /// Predictor name shown to the user
    pub name: String,
}

/// Levels available to a node created at `node_level`.
///
/// A node can only be refined on its own level or deeper ones.
pub fn level_options(fields: &[String], node_level: usize) -> Vec<LevelOption> {
    fields
        .iter()
        .enumerate()
        .skip(node_level)
        .map(|(index, name)| LevelOption {
            index,
            name: name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<String> {
        ["CPR", "TP", "WSPD", "CAPE", "SR"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn root_node_sees_every_level() {
        let options = level_options(&fields(), 0);
        assert_eq!(options.len(), 5);
        assert_eq!(options[0].name, "CPR");
    }

    #[test]
    fn deeper_node_skips_shallower_levels() {
        let options = level_options(&fields(), 2);
        let names: Vec<_> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["WSPD", "CAPE", "SR"]);
        assert_eq!(options[0].index, 2);
    }

    #[test]
    fn last_level_stays_selectable() {
        let options = level_options(&fields(), 4);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].index, 4);
        assert!(level_options(&fields(), 9).is_empty());
    }
}
