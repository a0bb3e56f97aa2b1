use super::{Derivative, PartialDerivative};
use num_dual::*;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub(crate) struct Cache {
    pub map: HashMap<PartialDerivative, f64>,
    pub hit: u64,
    pub miss: u64,
}

impl Cache {
    pub fn with_capacity(components: usize) -> Cache {
        let capacity = 5 + 2 * components;
        Cache {
            map: HashMap::with_capacity(capacity),
            hit: 0,
            miss: 0,
        }
    }

    fn lookup(&mut self, key: &PartialDerivative) -> Option<f64> {
        let value = self.map.get(key).copied();
        match value {
            Some(_) => self.hit += 1,
            None => self.miss += 1,
        }
        value
    }

    pub fn get_or_insert_with_f64<F: FnOnce() -> f64>(&mut self, f: F) -> f64 {
        if let Some(value) = self.lookup(&PartialDerivative::Zeroth) {
            return value;
        }
        let value = f();
        self.map.insert(PartialDerivative::Zeroth, value);
        value
    }

    pub fn get_or_insert_with_d64<F: FnOnce() -> Dual64>(
        &mut self,
        derivative: Derivative,
        f: F,
    ) -> f64 {
        if let Some(value) = self.lookup(&PartialDerivative::First(derivative)) {
            return value;
        }
        let value = f();
        self.map.insert(PartialDerivative::Zeroth, value.re);
        self.map
            .insert(PartialDerivative::First(derivative), value.eps);
        value.eps
    }

    pub fn get_or_insert_with_d2_64<F: FnOnce() -> Dual2_64>(
        &mut self,
        derivative: Derivative,
        f: F,
    ) -> f64 {
        if let Some(value) = self.lookup(&PartialDerivative::Second(derivative)) {
            return value;
        }
        let value = f();
        self.map.insert(PartialDerivative::Zeroth, value.re);
        self.map
            .insert(PartialDerivative::First(derivative), value.v1);
        self.map
            .insert(PartialDerivative::Second(derivative), value.v2);
        value.v2
    }

    pub fn get_or_insert_with_hd64<F: FnOnce() -> HyperDual64>(
        &mut self,
        derivative1: Derivative,
        derivative2: Derivative,
        f: F,
    ) -> f64 {
        let (d1, d2) = if derivative1 <= derivative2 {
            (derivative1, derivative2)
        } else {
            (derivative2, derivative1)
        };
        if let Some(value) = self.lookup(&PartialDerivative::SecondMixed(d1, d2)) {
            return value;
        }
        let value = f();
        self.map.insert(PartialDerivative::Zeroth, value.re);
        self.map
            .insert(PartialDerivative::First(derivative1), value.eps1);
        self.map
            .insert(PartialDerivative::First(derivative2), value.eps2);
        self.map
            .insert(PartialDerivative::SecondMixed(d1, d2), value.eps1eps2);
        value.eps1eps2
    }
}
