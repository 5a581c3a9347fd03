//! Generic backend: stock voices over formant presets. Always available.

use songforge_core::arrangement::SymbolicArrangement;
use songforge_core::{Stem, StockVoice};

use crate::error::VoiceError;

use super::{render_vocal_stem, VocalSynthesizer, VoiceTimbre};

/// Stock-voice vocal synthesizer.
#[derive(Debug, Clone)]
pub struct GenericVocalSynthesizer {
    voice: StockVoice,
}

impl GenericVocalSynthesizer {
    pub fn new(voice: StockVoice) -> Self {
        Self { voice }
    }

    fn timbre(&self) -> VoiceTimbre {
        match self.voice {
            StockVoice::Nova => VoiceTimbre {
                formant_scale: 1.15,
                breathiness: 0.08,
                vibrato_rate: 5.5,
                vibrato_depth: 0.010,
                gain: 0.8,
            },
            StockVoice::Ember => VoiceTimbre {
                formant_scale: 1.0,
                breathiness: 0.18,
                vibrato_rate: 5.0,
                vibrato_depth: 0.008,
                gain: 0.8,
            },
            StockVoice::Sage => VoiceTimbre {
                formant_scale: 0.85,
                breathiness: 0.12,
                vibrato_rate: 4.5,
                vibrato_depth: 0.006,
                gain: 0.8,
            },
        }
    }
}

impl VocalSynthesizer for GenericVocalSynthesizer {
    fn synthesize_vocal(&self, arrangement: &SymbolicArrangement) -> Result<Stem, VoiceError> {
        let tag = format!("vocal:stock:{}", self.voice.as_str());
        render_vocal_stem(arrangement, &self.timbre(), &tag)
    }
}
