pub mod constants;
pub mod energy;
pub mod error;
pub mod lct;
pub mod pairing;
pub mod params;
pub mod queue;
pub mod registry;
pub mod score;
pub mod society;
pub mod tensor;
pub mod transaction;
pub mod types;

pub use constants::*;
pub use energy::{AdpToken, AtpToken, EnergyPool, R6Action};
pub use error::{ErrorCode, Web4Error};
pub use lct::{BirthCertificate, BirthWitness, EntityType, Lct, LctStatus, Mrh, MrhSet, WitnessRecord};
pub use pairing::{ActivePairing, PairingChallenge, PairingSession, PairingStatus, SessionStatus};
pub use params::{
    ApprovedProducer, CalcAlgorithm, EnergyParams, PairingParams, ParamsUpdate, QueueParams,
    TrustParams,
};
pub use queue::{
    OfflineOperation, PairingRequest, Priority, QueueStatus, RequestStatus, RequestType, SubQueue,
};
pub use registry::{AuthorizationDecision, ComponentRecord, PairingAuthorization, RevocationEvent};
pub use score::{ScoreDelta, ScoreMicros, SCORE_SCALE};
pub use society::{
    CitizenRecord, Constitution, Dispute, DisputeStatus, LawDecision, Society, Verdict,
};
pub use tensor::{
    Dimension, DimensionState, Polarity, RelationshipTrustTensor, TensorEntry, TensorKind,
    TensorWitness,
};
pub use transaction::{AdminStatus, DisputeResolution, Msg, Transaction, TransactionBody};
pub use types::*;
