use async_trait::async_trait;
use attachment_store::config::StorageConfig;
use attachment_store::s3::{ObjectBackend, ObjectData, PutObject};
use attachment_store::{Result, StorageError, StorageFacade};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 进程内的对象存储，行为与 S3 一致：删除不存在的键也成功
#[derive(Default)]
pub struct MemoryBackend {
    bucket_created: AtomicBool,
    objects: Mutex<HashMap<String, PutObject>>,
}

impl MemoryBackend {
    pub fn stored(&self, key: &str) -> Option<PutObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn bucket_exists(&self) -> Result<bool> {
        Ok(self.bucket_created.load(Ordering::SeqCst))
    }

    async fn create_bucket(&self) -> Result<()> {
        self.bucket_created.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn put_object(&self, request: PutObject) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(request.key.clone(), request);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<ObjectData> {
        let object = self.stored(key).ok_or_else(|| StorageError::NotFound {
            key: key.to_string(),
        })?;
        Ok(ObjectData {
            content_type: Some(object.content_type),
            content_disposition: Some(object.content_disposition),
            ..ObjectData::from_bytes(object.body)
        })
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String> {
        Ok(format!(
            "memory://{key}?X-Amz-Expires={}",
            expires_in.as_secs()
        ))
    }
}

pub fn memory_facade(config: StorageConfig) -> (Arc<StorageFacade>, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::default());
    let storage = StorageFacade::new(Arc::new(config), backend.clone());
    (Arc::new(storage), backend)
}
