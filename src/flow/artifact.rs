use super::model::Flow;
use crate::error::ArtifactError;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use std::fs;
use std::io::{Read, Write};

impl Flow {
    /// Encodes the flow as a compact binary snapshot.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard()).map_err(|e| ArtifactError::Encode(e.to_string()))
    }

    /// Saves the flow snapshot to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path)
            .map_err(|e| ArtifactError::Io(format!("Could not create file '{}': {}", path, e)))?;
        file.write_all(&bytes)
            .map_err(|e| ArtifactError::Io(format!("Could not write to file '{}': {}", path, e)))?;
        Ok(())
    }

    /// Loads a flow snapshot from a file.
    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let mut file = fs::File::open(path)
            .map_err(|e| ArtifactError::Io(format!("Could not open file '{}': {}", path, e)))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| ArtifactError::Io(format!("Could not read from file '{}': {}", path, e)))?;
        Self::from_bytes(&bytes)
    }

    /// Deserializes a flow snapshot from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(flow, _)| flow)
            .map_err(|e| ArtifactError::Decode(e.to_string()))
    }
}
