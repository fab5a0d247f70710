use std::{fmt, sync::Arc};

use crate::id::IdGenerator;

static ANONYMOUS_VARIABLES: IdGenerator = IdGenerator::new();

/// A logical pattern variable. Two variables are equal exactly when they have the same name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Variable {
    /// A variable written by the user, such as `$x`.
    Named(Arc<str>),
    /// A variable generated for a pattern position the user left unnamed.
    Anonymous(usize),
}

impl Variable {
    pub fn named(name: impl AsRef<str>) -> Self {
        Self::Named(Arc::from(name.as_ref()))
    }

    /// Generates a variable distinct from every other variable in the process.
    pub fn anonymous() -> Self {
        Self::Anonymous(ANONYMOUS_VARIABLES.generate_id())
    }

    pub fn is_user_defined(&self) -> bool {
        matches!(self, Self::Named(_))
    }

    /// A user defined variable with the same identity, so that it is mapped by unifiers. Named
    /// variables are returned as is.
    pub fn as_user_defined(&self) -> Self {
        match self {
            Self::Named(_) => self.clone(),
            Self::Anonymous(index) => Self::Named(Arc::from(format!("_{index}").as_str())),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Named(name) => write!(f, "${name}"),
            Variable::Anonymous(index) => write!(f, "$_{index}"),
        }
    }
}
