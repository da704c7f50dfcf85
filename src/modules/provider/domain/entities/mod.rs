pub mod foreign_payload;

pub use foreign_payload::{
    ForeignAnime, ForeignAnimeRef, ForeignAppearance, ForeignBroadcast, ForeignCharacter,
    ForeignImageUrls, ForeignImages, ForeignPayload, ForeignRef, ForeignTitle, ForeignVoice,
};
