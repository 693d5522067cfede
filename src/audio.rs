//! Fire-and-forget sound effects
//!
//! Game logic writes a [`SoundCue`]; this module turns each cue into a one-shot
//! audio player that despawns itself when playback ends.

use bevy::prelude::*;

/// Plugin for bump and fall sounds
pub struct SoundPlugin;

impl Plugin for SoundPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<SoundCue>()
            .add_systems(Startup, load_sounds)
            .add_systems(Update, play_sound_cues);
    }
}

/// A sound the scene wants played.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// The car struck a prop.
    Bump,
    /// The round ended.
    Fall,
}

/// Loaded sound handles.
#[derive(Resource)]
pub struct SoundAssets {
    bump: Handle<AudioSource>,
    fall: Handle<AudioSource>,
}

impl SoundAssets {
    fn handle(&self, cue: SoundCue) -> Handle<AudioSource> {
        match cue {
            SoundCue::Bump => self.bump.clone(),
            SoundCue::Fall => self.fall.clone(),
        }
    }
}

/// Load sound assets on startup.
fn load_sounds(mut commands: Commands, asset_server: Res<AssetServer>) {
    commands.insert_resource(SoundAssets {
        bump: asset_server.load("sounds/bump.wav"),
        fall: asset_server.load("sounds/short-whistle-fall.wav"),
    });
}

/// Spawn an audio player for every cue written this frame.
fn play_sound_cues(
    mut commands: Commands,
    mut cues: MessageReader<SoundCue>,
    sounds: Option<Res<SoundAssets>>,
) {
    let Some(sounds) = sounds else {
        return;
    };

    for cue in cues.read() {
        debug!("Playing {:?} sound", cue);
        commands.spawn((AudioPlayer::new(sounds.handle(*cue)), PlaybackSettings::DESPAWN));
    }
}
