/// Consensus configuration parameters.
///
/// These knobs change which blocks a node is willing to accept, so every
/// node of a network should run with the same values.
#[derive(Clone, Debug, Default)]
pub struct ConsensusConfig {
    /// Reject chat blocks whose public key was never registered through a
    /// `user` block.
    ///
    /// When `false` (the default), a chat from an unknown key is accepted as
    /// long as its signature verifies; only the name binding is skipped.
    pub require_registered_identity: bool,
}
