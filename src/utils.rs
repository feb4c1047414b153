use bitflags::bitflags;

bitflags! {
    pub struct CompileFlags: u32 {
        const NO_FLAG = 0;
        const MINIMIZE = 1 << 1;
        const KEEP_STAGES = 1 << 2;
    }
}

impl Default for CompileFlags {
    fn default() -> Self {
        CompileFlags::MINIMIZE
    }
}
