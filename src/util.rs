/// Elements with a width (eg. when stored in a frame, where `long` and `double` take two slots)
pub trait Width {
    fn width(&self) -> usize;
}
