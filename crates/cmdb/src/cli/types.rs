//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::Direction;

/// Which way `impact` walks the graph
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkArg {
    /// Everything that relies on the CI (inbound edges)
    #[default]
    Impact,
    /// Everything the CI relies on (outbound edges)
    #[value(alias = "deps")]
    Dependencies,
    /// Both ways
    Both,
}

impl std::fmt::Display for WalkArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Impact => write!(f, "impact"),
            Self::Dependencies => write!(f, "dependencies"),
            Self::Both => write!(f, "both"),
        }
    }
}

impl From<WalkArg> for Direction {
    fn from(arg: WalkArg) -> Self {
        match arg {
            WalkArg::Impact => Direction::Target,
            WalkArg::Dependencies => Direction::Source,
            WalkArg::Both => Direction::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(WalkArg::Impact, Direction::Target, "impact")]
    #[case(WalkArg::Dependencies, Direction::Source, "dependencies")]
    #[case(WalkArg::Both, Direction::All, "both")]
    fn test_walk_arg(#[case] arg: WalkArg, #[case] direction: Direction, #[case] text: &str) {
        assert_eq!(Direction::from(arg), direction);
        assert_eq!(arg.to_string(), text);
        assert_eq!(WalkArg::from_str(text, false).unwrap(), arg);
    }

    #[test]
    fn test_walk_arg_alias() {
        assert_eq!(WalkArg::from_str("deps", false).unwrap(), WalkArg::Dependencies);
    }
}
