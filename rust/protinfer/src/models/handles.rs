use serde::Serialize;

macro_rules! arena_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(u32);

        impl $name {
            /// # Panics
            ///
            /// When an arena holds more than `u32::MAX` entries. Handles are
            /// only created for the next free arena slot, so this is a capacity
            /// limit of one compilation and not a recoverable input error.
            pub(crate) fn new(index: usize) -> Self {
                Self(u32::try_from(index).expect("arena outgrew u32 handles"))
            }

            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_handle!(
    /// Handle of an input file registered with [`crate::Compiler::insert_file`].
    FileId
);
arena_handle!(AccessionId);
arena_handle!(PeptideId);
arena_handle!(PsmId);
arena_handle!(PsmSetId);
arena_handle!(
    /// Handle of a protein-ambiguity group. Group ids are ordered by the
    /// smallest accession of the group, so they do not depend on insertion order.
    GroupId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_index() {
        assert_eq!(PsmId::new(7).index(), 7);
        assert_eq!(GroupId::new(0).to_string(), "0");
        assert!(AccessionId::new(1) < AccessionId::new(2));
    }

    #[test]
    #[should_panic(expected = "arena outgrew u32 handles")]
    fn test_handle_capacity() {
        PsmId::new(u32::MAX as usize + 1);
    }
}
