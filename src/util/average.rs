use std::{
    fmt::Debug,
    ops::{Add, Div},
};

use crate::quantities::Float;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoItems;

pub trait Average: Sized {
    type Aggregator;
    type Output;

    fn new_aggregator() -> Self::Aggregator;

    fn aggregate(aggregator: Self::Aggregator, next: Self) -> Self::Aggregator;

    fn average(aggregator: Self::Aggregator) -> Self::Output;
}

impl<T> Average for T
where
    T: Add<T, Output = T> + Div<Float, Output = T>,
{
    type Aggregator = Option<(T, usize)>;
    type Output = Result<T, NoItems>;

    fn new_aggregator() -> Self::Aggregator {
        None
    }

    fn aggregate(aggregator: Self::Aggregator, next: Self) -> Self::Aggregator {
        match aggregator {
            Some((total, count)) => Some((total + next, count + 1)),
            None => Some((next, 1)),
        }
    }

    fn average(aggregator: Self::Aggregator) -> Self::Output {
        #[allow(clippy::cast_precision_loss)]
        match aggregator {
            Some((total, count)) => Ok(total / count as Float),
            None => Err(NoItems),
        }
    }
}

pub trait IterAverage<T>
where
    T: Average,
{
    fn average(self) -> T::Output;
}

impl<T, I> IterAverage<T> for I
where
    I: IntoIterator<Item = T>,
    T: Average,
{
    fn average(self) -> <T as Average>::Output {
        T::average(self.into_iter().fold(T::new_aggregator(), T::aggregate))
    }
}

#[derive(Clone, Debug)]
pub struct Mean<T>
where
    T: Average,
{
    aggregator: T::Aggregator,
}

impl<T> Mean<T>
where
    T: Average,
    T::Aggregator: Clone,
{
    #[must_use]
    pub fn new() -> Mean<T> {
        Mean::default()
    }

    pub fn record(&mut self, value: T) {
        self.aggregator = T::aggregate(self.aggregator.clone(), value);
    }

    #[must_use]
    pub fn value(&self) -> T::Output {
        T::average(self.aggregator.clone())
    }
}

impl<T> Default for Mean<T>
where
    T: Average,
{
    fn default() -> Self {
        Mean {
            aggregator: T::new_aggregator(),
        }
    }
}
