mod construction;
mod cycles;
mod rendering;
