use crate::slug_value_api;

slug_value_api!(Genre);
