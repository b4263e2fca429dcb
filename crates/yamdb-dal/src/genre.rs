slug_entity!(Genre, "genre");
