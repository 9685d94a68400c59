use crate::embedder::FaceEmbedder;
use crate::error::FaceprintError;

/// Descriptor produced by the enrollment path, plus how many photos
/// actually contributed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrolledDescriptor {
    pub descriptor: Vec<f32>,
    pub photos_processed: usize,
}

/// Averages several per-photo descriptors into one and re-normalizes the
/// mean to unit length.
///
/// Every enrollment goes through here, single-photo included, so all
/// enrolled descriptors share one scale. The embedding model emits
/// unit-adjacent descriptors, so raw probes stay comparable with the
/// normalized result.
pub fn average_descriptors(descriptors: &[Vec<f32>]) -> Result<Vec<f32>, FaceprintError> {
    let Some(first) = descriptors.first() else {
        return Err(FaceprintError::EmptyInput);
    };
    let dim = first.len();
    for d in descriptors {
        if d.len() != dim {
            return Err(FaceprintError::DimensionMismatch {
                expected: dim,
                got: d.len(),
            });
        }
    }

    let n = descriptors.len() as f64;
    let mut mean = vec![0.0f32; dim];
    for (i, slot) in mean.iter_mut().enumerate() {
        let sum: f64 = descriptors.iter().map(|d| d[i] as f64).sum();
        *slot = (sum / n) as f32;
    }

    let norm: f64 = mean.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
    if norm > 0.0 {
        let scale = (1.0 / norm) as f32;
        for x in mean.iter_mut() {
            *x *= scale;
        }
    }
    Ok(mean)
}

/// Embeds each enrollment photo and averages the successful descriptors.
///
/// Photos where embedding fails are skipped; the request is rejected only
/// when no photo yields a descriptor, in which case the first failure is
/// returned so a single-photo caller still sees the precise cause.
pub async fn enroll_descriptor(
    embedder: &dyn FaceEmbedder,
    photos: &[Vec<u8>],
) -> Result<EnrolledDescriptor, FaceprintError> {
    if photos.is_empty() {
        return Err(FaceprintError::EmptyInput);
    }

    let mut descriptors = Vec::with_capacity(photos.len());
    let mut first_failure = None;
    for photo in photos {
        match embedder.embed(photo).await {
            Ok(d) => descriptors.push(d),
            Err(e) => {
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }
    }

    if descriptors.is_empty() {
        return Err(first_failure.unwrap_or(FaceprintError::EmptyInput));
    }

    let photos_processed = descriptors.len();
    let descriptor = average_descriptors(&descriptors)?;
    Ok(EnrolledDescriptor {
        descriptor,
        photos_processed,
    })
}
