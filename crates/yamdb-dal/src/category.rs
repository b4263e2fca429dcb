slug_entity!(Category, "category");
