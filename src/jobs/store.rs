//! # Storage de Jobs
//! src/jobs/store.rs
//!
//! Almacén clave/valor de `JobRecord` indexado por `job_id`.
//!
//! Disciplina de acceso: un solo escritor por clave (el worker dueño del
//! job) y cualquier cantidad de lectores. Los locks internos sólo protegen
//! el mapa; la exclusión entre workers viene de la partición por `job_id`.
//!
//! Implementaciones:
//! - `MemoryJobStore`: sólo en memoria
//! - `FileJobStore`: memoria + archivo JSON reescrito atómicamente en cada
//!   cambio de estado. El progreso intermedio queda sólo en memoria.

use crate::error::StoreError;
use crate::jobs::record::JobRecord;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Almacén de snapshots de jobs
pub trait JobStore: Send + Sync {
    /// Guarda o reemplaza el snapshot de un job
    fn put(&self, record: &JobRecord) -> Result<(), StoreError>;

    /// Guarda un snapshot que sólo cambia el progreso de un job en PROGRESS
    fn put_progress(&self, record: &JobRecord) -> Result<(), StoreError> {
        self.put(record)
    }

    /// Obtiene el último snapshot de un job
    fn get(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError>;

    /// Elimina un job
    fn remove(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError>;

    /// Elimina jobs terminados hace más de `max_age`. Retorna cuántos borró.
    fn evict_expired(&self, max_age: Duration) -> Result<usize, StoreError>;

    /// Número de jobs almacenados
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Retiene jobs no terminados y los terminados recientes
fn retain_unexpired(jobs: &mut HashMap<String, JobRecord>, max_age: Duration) -> usize {
    // Una retención fuera de rango equivale a no expirar nunca
    let Ok(max_age) = chrono::Duration::from_std(max_age) else {
        return 0;
    };
    let now = Utc::now();
    let before = jobs.len();

    jobs.retain(|_, job| match (job.is_terminal(), job.finished_at) {
        (true, Some(finished_at)) => now.signed_duration_since(finished_at) < max_age,
        _ => true,
    });

    before - jobs.len()
}

/// Store en memoria
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for MemoryJobStore {
    fn put(&self, record: &JobRecord) -> Result<(), StoreError> {
        self.jobs.write().insert(record.job_id.clone(), record.clone());
        Ok(())
    }

    fn get(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.jobs.read().get(job_id).cloned())
    }

    fn remove(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.jobs.write().remove(job_id))
    }

    fn evict_expired(&self, max_age: Duration) -> Result<usize, StoreError> {
        Ok(retain_unexpired(&mut self.jobs.write(), max_age))
    }

    fn len(&self) -> usize {
        self.jobs.read().len()
    }
}

/// Store persistente en un archivo JSON
///
/// Permite que los jobs sobrevivan a un reinicio del servidor. Cada cambio
/// de estado reescribe el archivo completo (temporal + rename); el progreso
/// intermedio no se persiste.
pub struct FileJobStore {
    path: PathBuf,
    jobs: Mutex<HashMap<String, JobRecord>>,
    #[cfg(test)]
    file_writes: AtomicUsize,
}

impl FileJobStore {
    /// Abre el store y carga los jobs existentes.
    ///
    /// Si el archivo no existe o está corrupto, empieza vacío.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let jobs = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            jobs: Mutex::new(jobs),
            #[cfg(test)]
            file_writes: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Marca como FAILED los jobs que quedaron a medias en una ejecución
    /// anterior. La cola no sobrevive al reinicio, así que nadie los va a
    /// retomar. Retorna cuántos marcó.
    pub fn fail_interrupted(&self) -> Result<usize, StoreError> {
        let mut jobs = self.jobs.lock();
        let mut failed = 0;

        for job in jobs.values_mut().filter(|job| !job.is_terminal()) {
            if job.fail("interrupted by server restart".to_string()).is_ok() {
                failed += 1;
            }
        }

        if failed > 0 {
            self.save_to_file(&jobs)?;
        }
        Ok(failed)
    }

    fn load_from_file(path: &Path) -> Result<HashMap<String, JobRecord>, StoreError> {
        let reader = BufReader::new(File::open(path)?);

        match serde_json::from_reader(reader) {
            Ok(jobs) => Ok(jobs),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt jobs file, starting empty");
                Ok(HashMap::new())
            }
        }
    }

    /// Escribe el mapa completo (se llama con el lock tomado)
    fn save_to_file(&self, jobs: &HashMap<String, JobRecord>) -> Result<(), StoreError> {
        let mut temp_path = self.path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        let mut writer = BufWriter::new(File::create(&temp_path)?);
        serde_json::to_writer(&mut writer, jobs)?;
        writer.flush()?;
        drop(writer);

        // Rename atómico en sistemas Unix
        fs::rename(&temp_path, &self.path)?;

        #[cfg(test)]
        self.file_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn file_writes(&self) -> usize {
        self.file_writes.load(Ordering::Relaxed)
    }
}

impl JobStore for FileJobStore {
    fn put(&self, record: &JobRecord) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock();
        jobs.insert(record.job_id.clone(), record.clone());
        self.save_to_file(&jobs)
    }

    fn put_progress(&self, record: &JobRecord) -> Result<(), StoreError> {
        self.jobs.lock().insert(record.job_id.clone(), record.clone());
        Ok(())
    }

    fn get(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.jobs.lock().get(job_id).cloned())
    }

    fn remove(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError> {
        let mut jobs = self.jobs.lock();
        let removed = jobs.remove(job_id);
        if removed.is_some() {
            self.save_to_file(&jobs)?;
        }
        Ok(removed)
    }

    fn evict_expired(&self, max_age: Duration) -> Result<usize, StoreError> {
        let mut jobs = self.jobs.lock();
        let removed = retain_unexpired(&mut jobs, max_age);
        if removed > 0 {
            self.save_to_file(&jobs)?;
        }
        Ok(removed)
    }

    fn len(&self) -> usize {
        self.jobs.lock().len()
    }
}
