pub mod anime;
pub mod character;
pub mod entity;

pub use anime::{Anime, AnimeTitles};
pub use character::{Character, CharacterAppearance, VoiceActor};
pub use entity::Entity;
