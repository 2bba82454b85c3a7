use crate::model::Trainable;

/// Plain gradient descent; the learning rate is reassigned before each epoch
#[derive(Debug, Clone)]
pub struct Optimizer {
    pub learning_rate: f32,
}

impl Optimizer {
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }

    pub fn step<M: Trainable + ?Sized>(&self, model: &mut M) {
        model.update(self.learning_rate);
    }
}
