//! Checkpoint persistence.

use std::fs;
use std::path::{Path, PathBuf};

use candle_nn::VarMap;
use glossa_core::Result;

/// Accepts an opaque parameter snapshot plus an identifying label and
/// persists it durably. The trainer calls this once per epoch and never
/// reads snapshots back during a run.
pub trait CheckpointSink {
    /// Persist one snapshot under `label`.
    fn persist(&mut self, label: &str, params: &VarMap) -> Result<()>;
}

/// Writes one safetensors file per snapshot into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Create the sink, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// File path a label resolves to.
    pub fn path_for(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{label}.safetensors"))
    }
}

impl CheckpointSink for DirectorySink {
    fn persist(&mut self, label: &str, params: &VarMap) -> Result<()> {
        params.save(self.path_for(label))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarBuilder;

    #[test]
    fn persists_a_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path()).unwrap();

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        candle_nn::linear(3, 2, vb.pp("probe")).unwrap();

        sink.persist("run-e001-0", &varmap).unwrap();
        assert!(sink.path_for("run-e001-0").exists());
    }
}
