mod file_cache;
mod lazy_text;
mod memory_pressure;
