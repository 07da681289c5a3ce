pub trait TupleMapperSecond<Input, Output, Result>
where
    Self: Sized,
{
    fn map_second(self, mapper: impl FnOnce(Input) -> Output) -> Result;
}

impl<S, E, I, O> TupleMapperSecond<I, O, Result<(S, O), E>> for Result<(S, I), E> {
    fn map_second(self, mapper: impl FnOnce(I) -> O) -> Result<(S, O), E> {
        self.map(|(first, second)| (first, mapper(second)))
    }
}
