mod memory_manager;
