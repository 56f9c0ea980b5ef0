use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::error::{IrError, Result};

use super::static_variable::{InitKind, StaticVariable};

// Xavier values are drawn uniformly from [-limit, limit]
pub fn xavier_limit(fan_in: f32) -> f32 {
    (3.0 / fan_in).sqrt()
}

// Initial contents of a static variable with `num_elements` elements.
// Extern variables are filled by whoever owns the storage, so they yield None.
pub fn initial_values<R: Rng + ?Sized>(
    var: &StaticVariable,
    num_elements: usize,
    rng: &mut R,
) -> Result<Option<Vec<f32>>> {
    match var.init_kind {
        InitKind::Extern => Ok(None),

        InitKind::Broadcast => Ok(Some(vec![var.val; num_elements])),

        InitKind::Xavier => {
            if var.val <= 0.0 || !var.val.is_finite() {
                return Err(IrError::InvalidInitialization(format!(
                    "xavier fan-in must be positive, got {}",
                    var.val
                )));
            }

            let limit = xavier_limit(var.val);
            let dist = Uniform::new_inclusive(-limit, limit);
            Ok(Some(
                (0..num_elements).map(|_| dist.sample(rng)).collect(),
            ))
        }
    }
}
